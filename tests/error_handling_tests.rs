//! Error propagation and result handling tests
//! Covers error classification, exchange between owners, and transport across tasks

use ciphersweep::error::{AuditError, AuditResult, ErrorKind};
use proptest::prelude::*;
use std::mem;
use std::time::Duration;

fn parse_service(service: &str) -> AuditResult<u16> {
    let port: u16 = service.parse()?;
    Ok(port)
}

fn checked_service(service: &str) -> AuditResult<u16> {
    let port = parse_service(service)?;
    if port == 0 {
        return Err(AuditError::InvalidArgument(
            "port 0 is not valid".to_string(),
        ));
    }
    Ok(port)
}

#[test]
fn test_error_kind_classification() {
    assert_eq!(
        AuditError::ResolutionError("x".to_string()).kind(),
        ErrorKind::Resolution
    );
    assert_eq!(
        AuditError::ConnectionError("x".to_string()).kind(),
        ErrorKind::Connection
    );
    assert_eq!(
        AuditError::ConfigError("x".to_string()).kind(),
        ErrorKind::Config
    );
    assert_eq!(
        AuditError::ProbeError("x".to_string()).kind(),
        ErrorKind::Probe
    );
    assert_eq!(AuditError::TimeoutError.kind(), ErrorKind::Timeout);
    assert_eq!(
        AuditError::TlsError("x".to_string()).kind(),
        ErrorKind::Tls
    );
}

#[test]
fn test_fatal_errors_are_config_and_argument() {
    assert!(AuditError::ConfigError("bad".to_string()).is_fatal());
    assert!(AuditError::InvalidArgument("bad".to_string()).is_fatal());
    assert!(!AuditError::ResolutionError("bad".to_string()).is_fatal());
    assert!(!AuditError::ConnectionError("bad".to_string()).is_fatal());
    assert!(!AuditError::TimeoutError.is_fatal());
}

#[test]
fn test_swap_exchanges_two_values() {
    let mut first: AuditResult<u32> = Ok(1);
    let mut second: AuditResult<u32> = Ok(2);

    mem::swap(&mut first, &mut second);
    assert!(matches!(first, Ok(2)));
    assert!(matches!(second, Ok(1)));
}

#[test]
fn test_swap_moves_failure_between_owners() {
    let mut healthy: AuditResult<u32> = Ok(7);
    let mut broken: AuditResult<u32> = Err(AuditError::TimeoutError);

    mem::swap(&mut healthy, &mut broken);
    assert_eq!(healthy.as_ref().unwrap_err().kind(), ErrorKind::Timeout);
    assert!(matches!(broken, Ok(7)));

    // Swapping in the opposite direction restores the original owners
    mem::swap(&mut broken, &mut healthy);
    assert!(matches!(healthy, Ok(7)));
    assert_eq!(broken.as_ref().unwrap_err().kind(), ErrorKind::Timeout);
}

#[test]
fn test_swap_exchanges_two_failures() {
    let mut first: AuditResult<()> = Err(AuditError::ResolutionError("one".to_string()));
    let mut second: AuditResult<()> = Err(AuditError::ConnectionError("two".to_string()));

    mem::swap(&mut first, &mut second);

    let first_err = first.unwrap_err();
    let second_err = second.unwrap_err();
    assert_eq!(first_err.kind(), ErrorKind::Connection);
    assert!(first_err.to_string().contains("two"));
    assert_eq!(second_err.kind(), ErrorKind::Resolution);
    assert!(second_err.to_string().contains("one"));
}

#[test]
fn test_question_mark_converts_parse_failures() {
    assert_eq!(checked_service("443").unwrap(), 443);

    let err = checked_service("https").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = checked_service("0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("port 0"));
}

#[test]
fn test_io_errors_convert_via_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    let audit_err = AuditError::from(io_err);
    assert_eq!(audit_err.kind(), ErrorKind::Io);
    assert!(audit_err.to_string().contains("refused"));
}

#[tokio::test]
async fn test_results_cross_task_boundaries() {
    let handle = tokio::spawn(async {
        let result: AuditResult<String> =
            Err(AuditError::TlsError("handshake torn down".to_string()));
        result
    });

    let result = handle.await.unwrap();
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Tls);
    assert!(err.to_string().contains("handshake torn down"));
}

#[tokio::test]
async fn test_elapsed_timeout_becomes_audit_error() {
    let slept = tokio::time::timeout(
        Duration::from_millis(5),
        tokio::time::sleep(Duration::from_millis(200)),
    )
    .await;

    let err: AuditError = slept.unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

proptest! {
    #[test]
    fn prop_error_messages_survive_display(msg in "[a-zA-Z0-9 .:-]{1,64}") {
        let err = AuditError::ProbeError(msg.clone());
        prop_assert!(err.to_string().contains(&msg));
        prop_assert_eq!(err.kind(), ErrorKind::Probe);
    }

    #[test]
    fn prop_swap_preserves_messages(a in "[a-z]{1,20}", b in "[a-z]{1,20}") {
        let mut first: AuditResult<()> = Err(AuditError::ResolutionError(a.clone()));
        let mut second: AuditResult<()> = Err(AuditError::ProbeError(b.clone()));

        mem::swap(&mut first, &mut second);

        prop_assert!(first.unwrap_err().to_string().contains(&b));
        prop_assert!(second.unwrap_err().to_string().contains(&a));
    }
}
