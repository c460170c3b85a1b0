use super::*;

#[test]
fn test_from_token() {
    assert_eq!(HttpMethod::Get, HttpMethod::from_token("GET"));
    assert_eq!(HttpMethod::MSearch, HttpMethod::from_token("M-SEARCH"));
    assert_eq!(HttpMethod::MPost, HttpMethod::from_token("M-POST"));
    assert_eq!(HttpMethod::Notify, HttpMethod::from_token("NOTIFY"));
    assert_eq!(HttpMethod::Subscribe, HttpMethod::from_token("SUBSCRIBE"));
    assert_eq!(HttpMethod::Unsubscribe, HttpMethod::from_token("UNSUBSCRIBE"));
    // A wire POST is plain Post; whether it is a control action is
    // decided later from the SOAPACTION header.
    assert_eq!(HttpMethod::Post, HttpMethod::from_token("POST"));
}

#[test]
fn test_from_token_is_case_sensitive() {
    assert_eq!(HttpMethod::Unknown, HttpMethod::from_token("get"));
    assert_eq!(HttpMethod::Unknown, HttpMethod::from_token("m-search"));
    assert_eq!(HttpMethod::Unknown, HttpMethod::from_token("CONNECT"));
}

#[test]
fn test_as_str_round_trip() {
    for m in [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::MPost,
        HttpMethod::Subscribe,
        HttpMethod::Unsubscribe,
        HttpMethod::Notify,
        HttpMethod::MSearch,
    ] {
        assert_eq!(m, HttpMethod::from_token(m.as_str()));
    }
}

#[test]
fn test_internal_methods_map_to_wire_tokens() {
    assert_eq!("GET", HttpMethod::SimpleGet.as_str());
    assert_eq!("POST", HttpMethod::SoapPost.as_str());
}
