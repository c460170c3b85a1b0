use super::*;

#[test]
fn test_status_text() {
    assert_eq!("OK", status_text(200));
    assert_eq!("Bad Request", status_text(400));
    assert_eq!("Temporary Redirect", status_text(307));
    assert_eq!("Internal Server Error", status_text(500));
    assert_eq!("", status_text(299));
}
