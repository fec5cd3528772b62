//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//

// An in-process stand-in for the identity service and the NoSQL data service.
// It speaks just enough HTTP/1.1 for reqwest: one request per connection,
// answered with "Connection: close".

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use nosql_cloud_quickstart::{
    AccessTokenProvider, Handle, HandleMode, IdcsCredentials, StaticCredentialsProvider,
};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct MockTable {
    pub name: String,
    pub ddl: String,
    pub schema: Value,
    pub limits: Value,
    pub state: String,
    pub polls_left: usize,
    pub rows: HashMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct MockState {
    // identity service
    pub expires_in: u64,
    pub reject_refresh: bool,
    pub reject_password: bool,
    pub token_forms: Vec<String>,
    pub tokens_issued: usize,
    // data service
    pub creating_polls: usize,
    pub dropping_polls: usize,
    pub fail_creates: bool,
    pub exists_is_error: bool,
    pub bad_request_id: bool,
    pub ops: Vec<String>,
    pub auth_headers: Vec<String>,
    pub compartments: Vec<Option<String>>,
    pub tables: HashMap<String, MockTable>,
    pub versions: u8,
}

impl MockState {
    pub fn data_requests(&self) -> usize {
        self.ops.len()
    }
}

pub struct MockService {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<MockState>>,
}

impl MockService {
    pub async fn start() -> MockService {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock service");
        let addr = listener.local_addr().expect("mock service address");
        let state = Arc::new(Mutex::new(MockState {
            expires_in: 3600,
            ..Default::default()
        }));
        let st = state.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(s) => s,
                    Err(_) => return,
                };
                let st = st.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, st).await;
                });
            }
        });
        MockService { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock")
    }

    pub async fn cloudsim_handle(&self) -> Handle {
        Handle::builder()
            .endpoint(&self.url())
            .expect("endpoint")
            .mode(HandleMode::Cloudsim)
            .expect("mode")
            .timeout(Duration::from_secs(5))
            .expect("timeout")
            .build()
            .await
            .expect("build cloudsim handle")
    }

    pub fn token_provider(&self) -> AccessTokenProvider {
        let creds = StaticCredentialsProvider::new(
            IdcsCredentials::new("client-id", "client-secret"),
            IdcsCredentials::new("tracy", "password-1"),
        );
        AccessTokenProvider::new("entitlement-1", &self.url(), Box::new(creds))
            .expect("token provider")
            .request_timeout(Duration::from_secs(5))
    }

    pub async fn cloud_handle(&self) -> Handle {
        Handle::builder()
            .endpoint(&self.url())
            .expect("endpoint")
            .cloud_auth(self.token_provider())
            .expect("cloud auth")
            .timeout(Duration::from_secs(5))
            .expect("timeout")
            .build()
            .await
            .expect("build cloud handle")
    }
}

struct HttpRequest {
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<HttpRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(p) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break p;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }
    let len: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < len {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Ok(Some(HttpRequest {
        path,
        headers,
        body,
    }))
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<MockState>>) -> std::io::Result<()> {
    let req = match read_request(&mut stream).await? {
        Some(r) => r,
        None => return Ok(()),
    };
    let (status, body, request_id) = {
        let mut st = state.lock().expect("mock state lock");
        if req.path.ends_with("/oauth2/v1/token") {
            let (status, body) = token_response(&mut st, &req);
            (status, body, None)
        } else if req.path.ends_with("/V2/nosql/data") {
            let (status, body) = data_response(&mut st, &req);
            let mut rid = req.headers.get("x-nosql-request-id").cloned();
            if st.bad_request_id {
                rid = Some("999999".to_string());
            }
            (status, body, rid)
        } else {
            (404, json!({"error": "no such path"}), None)
        }
    };
    let body = body.to_string();
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Error",
    };
    let mut resp = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        reason,
        body.len()
    );
    if let Some(rid) = request_id {
        resp.push_str(&format!("x-nosql-request-id: {}\r\n", rid));
    }
    resp.push_str("\r\n");
    resp.push_str(&body);
    stream.write_all(resp.as_bytes()).await?;
    stream.shutdown().await
}

fn token_response(st: &mut MockState, req: &HttpRequest) -> (u16, Value) {
    let form = String::from_utf8_lossy(&req.body).to_string();
    st.token_forms.push(form.clone());
    if !req
        .headers
        .get("authorization")
        .map_or(false, |a| a.starts_with("Basic "))
    {
        return (401, json!({"error": "invalid_client"}));
    }
    let params: HashMap<String, String> = url::form_urlencoded::parse(form.as_bytes())
        .into_owned()
        .collect();
    match params.get("grant_type").map(|s| s.as_str()) {
        Some("refresh_token") if st.reject_refresh => {
            return (400, json!({"error": "invalid_grant"}));
        }
        Some("refresh_token") => {}
        Some("password") if st.reject_password => {
            return (401, json!({"error": "invalid_grant"}));
        }
        Some("password") => {
            if !params
                .get("scope")
                .map_or(false, |s| s.contains("entitlement-1"))
            {
                return (400, json!({"error": "invalid_scope"}));
            }
        }
        _ => return (400, json!({"error": "unsupported_grant_type"})),
    }
    st.tokens_issued += 1;
    let n = st.tokens_issued;
    (
        200,
        json!({
            "access_token": format!("tok-{}", n),
            "expires_in": st.expires_in,
            "refresh_token": format!("rt-{}", n),
        }),
    )
}

fn not_found(table: &str) -> (u16, Value) {
    (
        404,
        json!({"error_code": 2, "exception": format!("Table not found: {}", table)}),
    )
}

fn table_json(t: &MockTable) -> Value {
    json!({
        "table_name": t.name,
        "state": t.state,
        "ddl": t.ddl,
        "schema": t.schema,
        "limits": t.limits,
        "operation_id": format!("op-{}", t.name),
    })
}

// "CREATE TABLE IF NOT EXISTS T(id INTEGER, name STRING, PRIMARY KEY(id))"
fn parse_create(ddl: &str) -> Option<(String, Value)> {
    let open = ddl.find('(')?;
    let name = ddl[..open].split_whitespace().last()?.to_string();
    let body = &ddl[open + 1..ddl.rfind(')')?];
    let pk_at = body.find("PRIMARY KEY(")?;
    let pk_end = pk_at + body[pk_at..].find(')')?;
    let pk: Vec<String> = body[pk_at + "PRIMARY KEY(".len()..pk_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .collect();
    let columns: Vec<Value> = body[..pk_at]
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.split_once(' '))
        .map(|(n, t)| json!({"name": n, "type": t.trim()}))
        .collect();
    Some((name, json!({"columns": columns, "primary_key": pk})))
}

fn row_key(t: &MockTable, row: &Value) -> String {
    let mut k = Vec::new();
    if let Some(pk) = t.schema["primary_key"].as_array() {
        for c in pk {
            if let Some(c) = c.as_str() {
                k.push(row[c].to_string());
            }
        }
    }
    k.join("|")
}

fn data_response(st: &mut MockState, req: &HttpRequest) -> (u16, Value) {
    let auth = req.headers.get("authorization").cloned().unwrap_or_default();
    st.auth_headers.push(auth.clone());
    st.compartments
        .push(req.headers.get("x-nosql-compartment-id").cloned());
    let env: Value = match serde_json::from_slice(&req.body) {
        Ok(v) => v,
        Err(_) => return (400, json!({"error_code": 17, "exception": "bad body"})),
    };
    let op = env["op"].as_str().unwrap_or_default().to_string();
    st.ops.push(op.clone());
    if !auth.starts_with("Bearer ") {
        return (
            401,
            json!({"error_code": 11, "exception": "missing authorization"}),
        );
    }
    let table_name = env["table_name"].as_str().unwrap_or_default().to_string();
    let key = table_name.to_lowercase();
    let payload = &env["payload"];
    match op.as_str() {
        "TABLE_REQUEST" => {
            let stmt = payload["statement"].as_str().unwrap_or_default().to_string();
            if stmt.starts_with("CREATE") {
                if let Some(t) = st.tables.get(&key) {
                    if st.exists_is_error {
                        return (
                            200,
                            json!({"error_code": 9, "exception": format!("Table exists: {}", table_name)}),
                        );
                    }
                    return (200, table_json(t));
                }
                let (name, schema) = match parse_create(&stmt) {
                    Some(p) => p,
                    None => return (400, json!({"error_code": 4, "exception": "bad ddl"})),
                };
                let t = MockTable {
                    name,
                    ddl: stmt.clone(),
                    schema,
                    limits: payload["limits"].clone(),
                    state: "CREATING".to_string(),
                    polls_left: st.creating_polls,
                    rows: HashMap::new(),
                };
                let out = table_json(&t);
                st.tables.insert(key, t);
                (200, out)
            } else if stmt.starts_with("DROP") {
                let polls = st.dropping_polls;
                match st.tables.get_mut(&key) {
                    Some(t) => {
                        t.state = "DROPPING".to_string();
                        t.polls_left = polls;
                        (200, table_json(t))
                    }
                    None => not_found(&table_name),
                }
            } else {
                (400, json!({"error_code": 4, "exception": "unsupported statement"}))
            }
        }
        "GET_TABLE" => {
            let fail = st.fail_creates;
            let t = match st.tables.get_mut(&key) {
                Some(t) => t,
                None => return not_found(&table_name),
            };
            if t.polls_left > 0 {
                t.polls_left -= 1;
                return (200, table_json(t));
            }
            match t.state.as_str() {
                "CREATING" if fail => t.state = "FAILED".to_string(),
                "CREATING" => t.state = "ACTIVE".to_string(),
                "DROPPING" => t.state = "DROPPED".to_string(),
                _ => {}
            }
            let out = table_json(t);
            if t.state == "DROPPED" {
                st.tables.remove(&key);
            }
            (200, out)
        }
        "PUT" => {
            st.versions = st.versions.wrapping_add(1);
            let version = base64_of(&[st.versions]);
            let t = match st.tables.get_mut(&key) {
                Some(t) if t.state == "ACTIVE" => t,
                _ => return not_found(&table_name),
            };
            let row = payload["row"].clone();
            let k = row_key(t, &row);
            t.rows.insert(k, row);
            (200, json!({"success": true, "version": version}))
        }
        "GET" => {
            let t = match st.tables.get(&key) {
                Some(t) if t.state == "ACTIVE" => t,
                _ => return not_found(&table_name),
            };
            let k = row_key(t, &payload["key"]);
            match t.rows.get(&k) {
                Some(row) => (
                    200,
                    json!({"row": row, "version": "AQ==", "modification_time": 1700000000000i64}),
                ),
                None => (200, json!({"row": null})),
            }
        }
        _ => (400, json!({"error_code": 1, "exception": "unknown operation"})),
    }
}

fn base64_of(b: &[u8]) -> String {
    use base64::prelude::{Engine as _, BASE64_STANDARD};
    BASE64_STANDARD.encode(b)
}
