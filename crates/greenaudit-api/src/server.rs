use std::collections::BTreeMap;
use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Instant;

use greenaudit_core::{extract_score_with_source, parse_recommendations, Grade};
use greenaudit_gen::{
    build_generative_provider, GeminiConfig, GenerateRequest, GenerativeProvider,
    GenerativeProviderConfig, OpenAiCompatibleConfig,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::model::{AuditReport, AuditRequest};
use crate::prompt::{render_prompt, SYSTEM_INSTRUCTION};

#[derive(Default)]
struct MetricsRegistry {
    audits_ok: u64,
    audits_rejected: u64,
    audits_failed: u64,
    provider_latency_ms_sum: f64,
    provider_latency_ms_count: u64,
    provider_latency_ms_max: f64,
    score_source: BTreeMap<&'static str, u64>,
    grade: BTreeMap<&'static str, u64>,
}

/// Sustainability audit service. Holds the generative provider and the
/// request counters; HTTP serving is a thin layer on top of `run_audit`.
pub struct AuditServer {
    provider: Arc<dyn GenerativeProvider>,
    metrics: Mutex<MetricsRegistry>,
}

impl AuditServer {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            metrics: Mutex::new(MetricsRegistry::default()),
        }
    }

    pub fn from_env() -> Result<Self, String> {
        Ok(Self::new(provider_from_env()?))
    }

    /// Render the prompt, call the provider, and derive the report fields
    /// from whatever free-form reply came back.
    pub fn run_audit(&self, request: &AuditRequest) -> Result<AuditReport, String> {
        let generate = GenerateRequest::new(render_prompt(request))
            .with_system_instruction(SYSTEM_INSTRUCTION);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| format!("audit runtime initialization failed: {e}"))?;
        let started = Instant::now();
        let response = rt
            .block_on(async { self.provider.generate(generate).await })
            .map_err(|e| {
                self.record_audit_failed();
                format!("generative provider request failed: {e}")
            })?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let (score, source) = extract_score_with_source(&response.text);
        let grade = Grade::from_score(i32::from(score));
        let recommendations = parse_recommendations(&response.text);

        self.record_audit_ok(latency_ms, source.as_str(), grade.letter());

        Ok(AuditReport {
            reply: response.text,
            score,
            grade,
            grade_style: grade.style(),
            score_source: source.as_str(),
            recommendations,
            provider: response.provider,
            model: response.model,
        })
    }

    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        eprintln!("greenauditd listening on {}", listener.local_addr()?);
        for stream in listener.incoming() {
            match stream {
                Ok(mut stream) => {
                    if let Err(err) = self.handle_http_connection(&mut stream) {
                        eprintln!("greenauditd request error: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("greenauditd accept error: {err}");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, stream: &mut TcpStream) -> io::Result<()> {
        let Some(req) = read_http_request(stream)? else {
            return Ok(());
        };
        let response = self.dispatch_http_request(&req);
        write_http_response(stream, response)
    }

    fn dispatch_http_request(&self, req: &HttpRequest) -> HttpResponse {
        if req.method == "GET" && (req.path == "/health" || req.path == "/") {
            return HttpResponse::json(200, json!({"status":"ok"}));
        }

        if req.method == "GET" && req.path == "/metrics" {
            return HttpResponse::text(
                200,
                "text/plain; version=0.0.4; charset=utf-8",
                self.render_metrics_text(),
            );
        }

        if req.path == "/api/ai" {
            if req.method != "POST" {
                return HttpResponse::json(
                    405,
                    json!({"error":"method not allowed, use POST /api/ai"}),
                );
            }
            return self.handle_audit(&req.body);
        }

        HttpResponse::json(404, json!({"error":"not found"}))
    }

    fn handle_audit(&self, body: &[u8]) -> HttpResponse {
        let request: AuditRequest = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                self.record_audit_rejected();
                return HttpResponse::json(
                    400,
                    json!({"error": format!("all business metrics are required: {err}")}),
                );
            }
        };
        if let Err(msg) = request.validate() {
            self.record_audit_rejected();
            return HttpResponse::json(400, json!({"error": msg}));
        }

        match self.run_audit(&request) {
            Ok(report) => match serde_json::to_value(&report) {
                Ok(value) => HttpResponse::json(200, value),
                Err(err) => HttpResponse::json(
                    500,
                    json!({"error": format!("report serialization failed: {err}")}),
                ),
            },
            Err(msg) => HttpResponse::json(502, json!({"error": msg})),
        }
    }

    fn record_audit_ok(&self, latency_ms: f64, source: &'static str, grade: &'static str) {
        let mut locked = self.metrics.lock();
        locked.audits_ok = locked.audits_ok.saturating_add(1);
        locked.provider_latency_ms_sum += latency_ms;
        locked.provider_latency_ms_count = locked.provider_latency_ms_count.saturating_add(1);
        locked.provider_latency_ms_max = locked.provider_latency_ms_max.max(latency_ms);
        *locked.score_source.entry(source).or_default() += 1;
        *locked.grade.entry(grade).or_default() += 1;
    }

    fn record_audit_rejected(&self) {
        let mut locked = self.metrics.lock();
        locked.audits_rejected = locked.audits_rejected.saturating_add(1);
    }

    fn record_audit_failed(&self) {
        let mut locked = self.metrics.lock();
        locked.audits_failed = locked.audits_failed.saturating_add(1);
    }

    fn render_metrics_text(&self) -> String {
        let mut lines = vec![
            "# TYPE greenaudit_audit_requests_total counter".to_string(),
            "# TYPE greenaudit_provider_latency_ms_sum counter".to_string(),
            "# TYPE greenaudit_provider_latency_ms_count counter".to_string(),
            "# TYPE greenaudit_provider_latency_ms_max gauge".to_string(),
            "# TYPE greenaudit_score_source_total counter".to_string(),
            "# TYPE greenaudit_grade_total counter".to_string(),
        ];

        let locked = self.metrics.lock();
        lines.push(format!(
            "greenaudit_audit_requests_total{{status=\"ok\"}} {}",
            locked.audits_ok
        ));
        lines.push(format!(
            "greenaudit_audit_requests_total{{status=\"rejected\"}} {}",
            locked.audits_rejected
        ));
        lines.push(format!(
            "greenaudit_audit_requests_total{{status=\"failed\"}} {}",
            locked.audits_failed
        ));
        lines.push(format!(
            "greenaudit_provider_latency_ms_sum {:.3}",
            locked.provider_latency_ms_sum
        ));
        lines.push(format!(
            "greenaudit_provider_latency_ms_count {}",
            locked.provider_latency_ms_count
        ));
        lines.push(format!(
            "greenaudit_provider_latency_ms_max {:.3}",
            locked.provider_latency_ms_max
        ));
        for (source, count) in &locked.score_source {
            lines.push(format!(
                "greenaudit_score_source_total{{source=\"{source}\"}} {count}"
            ));
        }
        for (grade, count) in &locked.grade {
            lines.push(format!("greenaudit_grade_total{{grade=\"{grade}\"}} {count}"));
        }
        drop(locked);

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn provider_from_env() -> Result<Arc<dyn GenerativeProvider>, String> {
    let provider = std::env::var("GREENAUDIT_GEN_PROVIDER")
        .ok()
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "gemini".to_string());

    match provider.as_str() {
        "gemini" => {
            let api_key = std::env::var("GREENAUDIT_GEN_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .or_else(|_| std::env::var("GEMINI_KEY"))
                .map_err(|_| {
                    "GREENAUDIT_GEN_API_KEY or GEMINI_API_KEY is not configured. Audit submissions are disabled."
                        .to_string()
                })?;
            let model = std::env::var("GREENAUDIT_GEN_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string());
            let mut cfg = GeminiConfig::new(api_key, model);
            if let Ok(base_url) = std::env::var("GREENAUDIT_GEN_BASE_URL") {
                cfg.base_url = base_url;
            }
            build_generative_provider(GenerativeProviderConfig::Gemini(cfg))
                .map_err(|e| format!("generative provider initialization failed: {e}"))
        }
        "openai-compatible" => {
            let api_key = std::env::var("GREENAUDIT_GEN_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .map_err(|_| {
                    "GREENAUDIT_GEN_API_KEY or OPENAI_API_KEY is not configured. Audit submissions are disabled."
                        .to_string()
                })?;
            let model = std::env::var("GREENAUDIT_GEN_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string());
            let mut cfg = OpenAiCompatibleConfig::new(api_key, model);
            if let Ok(base_url) = std::env::var("GREENAUDIT_GEN_BASE_URL") {
                cfg.base_url = base_url;
            }
            build_generative_provider(GenerativeProviderConfig::OpenAiCompatible(cfg))
                .map_err(|e| format!("generative provider initialization failed: {e}"))
        }
        other => Err(format!(
            "unknown GREENAUDIT_GEN_PROVIDER '{other}' (expected 'gemini' or 'openai-compatible')"
        )),
    }
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    fn json(status: u16, value: Value) -> Self {
        let body = serde_json::to_vec(&value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn text(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            body: body.into_bytes(),
        }
    }
}

fn read_http_request(stream: &TcpStream) -> io::Result<Option<HttpRequest>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let first = line.trim_end_matches(['\r', '\n']);
    if first.is_empty() {
        return Ok(None);
    }

    let mut parts = first.split_whitespace();
    let Some(method) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing method)",
        ));
    };
    let Some(path_with_query) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing path)",
        ));
    };
    let path = path_with_query
        .split_once('?')
        .map_or(path_with_query, |(p, _)| p)
        .to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0_u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok(Some(HttpRequest {
        method: method.to_string(),
        path,
        body,
    }))
}

fn write_http_response(stream: &mut TcpStream, response: HttpResponse) -> io::Result<()> {
    let reason = http_reason_phrase(response.status);
    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    stream.write_all(headers.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "OK",
    }
}
