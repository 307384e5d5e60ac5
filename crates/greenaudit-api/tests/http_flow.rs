use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Stdio};
use std::time::Duration;

fn reserve_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve addr");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}

fn wait_for_http(addr: &str) {
    for _ in 0..80 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on {addr}");
}

fn send_http(addr: &str, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn response_body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

fn spawn_daemon(addr: &str) -> std::process::Child {
    // The provider base URL points at a closed port so audit calls fail
    // fast instead of reaching a real API.
    Command::new(env!("CARGO_BIN_EXE_greenauditd"))
        .env("GREENAUDIT_HTTP_ADDR", addr)
        .env("GREENAUDIT_GEN_PROVIDER", "gemini")
        .env("GEMINI_KEY", "test-key")
        .env("GREENAUDIT_GEN_BASE_URL", "http://127.0.0.1:9")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn greenauditd")
}

const FULL_BODY: &str = r#"{
    "text": "Zero-waste grocery delivery",
    "paperUsage": 3,
    "cloudSpending": 180,
    "remotePercent": 70,
    "disposableCost": 25,
    "electricityUsage": 520,
    "wasteVolume": 8
}"#;

#[test]
fn http_health_validation_and_metrics_work() {
    let addr = reserve_addr();
    let mut child = spawn_daemon(&addr);

    wait_for_http(&addr);

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(response_body(&health).contains("\"status\":\"ok\""));

    let root = send_http(&addr, "GET", "/", "");
    assert!(root.starts_with("HTTP/1.1 200"));

    let incomplete = send_http(&addr, "POST", "/api/ai", r#"{"text":"idea","paperUsage":3}"#);
    assert!(incomplete.starts_with("HTTP/1.1 400"));
    assert!(response_body(&incomplete).contains("all business metrics are required"));

    let blank_text = send_http(
        &addr,
        "POST",
        "/api/ai",
        &FULL_BODY.replace("Zero-waste grocery delivery", "   "),
    );
    assert!(blank_text.starts_with("HTTP/1.1 400"));

    let unreachable = send_http(&addr, "POST", "/api/ai", FULL_BODY);
    assert!(unreachable.starts_with("HTTP/1.1 502"));
    assert!(response_body(&unreachable).contains("generative provider request failed"));

    let wrong_method = send_http(&addr, "GET", "/api/ai", "");
    assert!(wrong_method.starts_with("HTTP/1.1 405"));

    let missing = send_http(&addr, "GET", "/nope", "");
    assert!(missing.starts_with("HTTP/1.1 404"));

    let metrics = send_http(&addr, "GET", "/metrics", "");
    assert!(metrics.starts_with("HTTP/1.1 200"));
    let metrics_body = response_body(&metrics);
    assert!(metrics_body.contains("greenaudit_audit_requests_total{status=\"rejected\"} 2"));
    assert!(metrics_body.contains("greenaudit_audit_requests_total{status=\"failed\"} 1"));
    assert!(metrics_body.contains("# TYPE greenaudit_provider_latency_ms_sum counter"));

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn daemon_requires_api_key() {
    let status = Command::new(env!("CARGO_BIN_EXE_greenauditd"))
        .env_remove("GREENAUDIT_GEN_PROVIDER")
        .env_remove("GREENAUDIT_GEN_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_KEY")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("run greenauditd");
    assert!(!status.success());
}
