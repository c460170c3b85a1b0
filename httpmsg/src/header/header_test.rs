use super::*;

#[test]
fn test_from_name_case_insensitive() {
    assert_eq!(HeaderId::Host, HeaderId::from_name("Host"));
    assert_eq!(HeaderId::Host, HeaderId::from_name("HOST"));
    assert_eq!(HeaderId::Host, HeaderId::from_name("host"));
    assert_eq!(HeaderId::ContentLength, HeaderId::from_name("Content-Length"));
    assert_eq!(HeaderId::St, HeaderId::from_name("ST"));
    assert_eq!(HeaderId::Unknown, HeaderId::from_name("X-Custom"));
}

#[test]
fn test_known_headers_fold() {
    let mut headers = HeaderMap::new();
    headers.add("Cache-Control", b"no-cache");
    headers.add("CACHE-CONTROL", b"max-age=0");
    assert_eq!(1, headers.len());
    assert_eq!(
        Some("no-cache, max-age=0"),
        headers.find_text(HeaderId::CacheControl)
    );
}

#[test]
fn test_unknown_headers_stay_separate() {
    let mut headers = HeaderMap::new();
    headers.add("X-Custom", b"one");
    headers.add("X-Custom", b"two");
    assert_eq!(2, headers.len());
    assert_eq!(Some(&b"one"[..]), headers.find_name("x-custom"));
}

#[test]
fn test_find_missing_is_none() {
    let headers = HeaderMap::new();
    assert!(headers.is_empty());
    assert_eq!(None, headers.find(HeaderId::Host));
    assert_eq!(None, headers.find_name("host"));
}

#[test]
fn test_find_preserves_raw_name() {
    let mut headers = HeaderMap::new();
    headers.add("HOST", b"239.255.255.250:1900");
    let h = headers.iter().next().unwrap();
    assert_eq!("HOST", h.name);
    assert_eq!(HeaderId::Host, h.id);
    assert_eq!("HOST: 239.255.255.250:1900", h.to_string());
}
