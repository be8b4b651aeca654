//! Handshake probe tests against a local TLS server

use ciphersweep::tls::probe::{HandshakeProber, ProbeOutcome, ProbeTarget, Prober};
use ciphersweep::tls::{CipherDescriptor, TlsProtocol};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::{X509, X509NameBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

fn self_signed_identity() -> (PKey<Private>, X509) {
    let rsa = Rsa::generate(2048).unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(1).unwrap())
        .unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();

    (pkey, builder.build())
}

/// Start a TLS server on a loopback port and handshake every client
fn spawn_tls_server() -> SocketAddr {
    let (pkey, cert) = self_signed_identity();

    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pkey).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    let acceptor = Arc::new(acceptor.build());

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            if let Ok(stream) = stream {
                let acceptor = acceptor.clone();
                std::thread::spawn(move || {
                    // Complete or fail the handshake, then hang up
                    let _ = acceptor.accept(stream);
                });
            }
        }
    });

    addr
}

/// Accept TCP connections but never speak TLS
fn spawn_silent_server() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            if let Ok(stream) = stream {
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_secs(10));
                    drop(stream);
                });
            }
        }
    });

    addr
}

fn prober() -> HandshakeProber {
    HandshakeProber::new(Duration::from_millis(2000), Duration::from_millis(2000))
}

#[tokio::test]
async fn test_probe_accepts_supported_tls12_cipher() {
    let addr = spawn_tls_server();
    let target = ProbeTarget::new("localhost".to_string(), addr);
    let cipher = CipherDescriptor::new("ECDHE-RSA-AES128-GCM-SHA256", "TLSv1.2", 128);

    let outcome = prober().probe(&target, TlsProtocol::Tls12, &cipher).await;
    assert_eq!(outcome, ProbeOutcome::Accepted);
}

#[tokio::test]
async fn test_probe_accepts_supported_tls13_suite() {
    let addr = spawn_tls_server();
    let target = ProbeTarget::new("localhost".to_string(), addr);
    let cipher = CipherDescriptor::new("TLS_AES_128_GCM_SHA256", "TLSv1.3", 128);

    let outcome = prober().probe(&target, TlsProtocol::Tls13, &cipher).await;
    assert_eq!(outcome, ProbeOutcome::Accepted);
}

#[tokio::test]
async fn test_probe_rejects_cipher_the_server_does_not_offer() {
    let addr = spawn_tls_server();
    let target = ProbeTarget::new("localhost".to_string(), addr);
    // CBC suite, not part of the server's modern profile
    let cipher = CipherDescriptor::new("AES128-SHA", "SSLv3", 128);

    let outcome = prober().probe(&target, TlsProtocol::Tls12, &cipher).await;
    assert_eq!(outcome, ProbeOutcome::Rejected);
}

#[tokio::test]
async fn test_probe_rejects_protocol_below_server_minimum() {
    let addr = spawn_tls_server();
    let target = ProbeTarget::new("localhost".to_string(), addr);
    let cipher = CipherDescriptor::new("AES128-SHA", "SSLv3", 128);

    let outcome = prober().probe(&target, TlsProtocol::Tls1, &cipher).await;
    assert_eq!(outcome, ProbeOutcome::Rejected);
}

#[tokio::test]
async fn test_probe_reports_connection_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let target = ProbeTarget::new("localhost".to_string(), addr);
    let cipher = CipherDescriptor::new("ECDHE-RSA-AES128-GCM-SHA256", "TLSv1.2", 128);

    let outcome = prober().probe(&target, TlsProtocol::Tls12, &cipher).await;
    assert_eq!(outcome, ProbeOutcome::ConnectionFailed);
}

#[tokio::test]
async fn test_probe_times_out_on_silent_server() {
    let addr = spawn_silent_server();
    let target = ProbeTarget::new("localhost".to_string(), addr);
    let cipher = CipherDescriptor::new("ECDHE-RSA-AES128-GCM-SHA256", "TLSv1.2", 128);

    let prober = HandshakeProber::new(Duration::from_millis(2000), Duration::from_millis(300));
    let start = std::time::Instant::now();
    let outcome = prober.probe(&target, TlsProtocol::Tls12, &cipher).await;
    let elapsed = start.elapsed();

    match outcome {
        ProbeOutcome::Error(reason) => assert!(reason.contains("timed out")),
        other => panic!("expected timeout error, got {:?}", other),
    }
    assert!(elapsed < Duration::from_secs(5));
}
