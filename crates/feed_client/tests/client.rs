//! Wire-contract tests against a mock feed service.

use httpmock::prelude::*;
use serde_json::json;

use filingdesk_feed_client::{AnalysisRequest, ClientError, FeedClient, DEFAULT_TIMEOUT};
use filingdesk_recon::{FetchError, FilingFeed, MatchStatus, RecordSource};

fn client(server: &MockServer) -> FeedClient {
    FeedClient::new(server.base_url(), DEFAULT_TIMEOUT).unwrap()
}

#[test]
fn test_fetch_filings_uppercases_subject() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/filings/ACME");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "filings": [
                    {"accessionId": "0001-26-1", "filingDate": "2026-02-01", "formType": "8-K",
                     "description": "Current report", "documentUrl": "https://docs.test/1.htm"},
                    {"accessionId": "0001-26-2", "filingDate": "2026-02-03", "formType": "4"}
                ]
            }));
    });

    let filings = client(&server).get_filings(" acme ").unwrap();
    mock.assert();
    assert_eq!(filings.len(), 2);
    assert_eq!(filings[0].document_url, "https://docs.test/1.htm");
    assert_eq!(filings[1].description, "");
}

#[test]
fn test_bearer_token_sent_when_present() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/filings/ACME")
            .header("authorization", "Bearer tok123");
        then.status(200).json_body(json!({ "filings": [] }));
    });

    let client = client(&server).with_token(Some("tok123".into()));
    assert!(client.is_authenticated());
    assert!(client.get_filings("ACME").unwrap().is_empty());
    mock.assert();
}

#[test]
fn test_fetch_knowledge() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/knowledge/ACME");
        then.status(200).json_body(json!({
            "records": [
                {"date": "2026-02-01", "formType": "8-K", "accessionId": "0001-26-1"},
                {"date": "2019-05-01", "formType": "10-Q"}
            ],
            "crossRefs": {
                "0001-26-2": [{"sourceLabel": "timeline", "capturedFact": "insider buy"}],
                "10-Q|2019-05-01": [{"sourceLabel": "notes", "capturedFact": "restated"}]
            }
        }));
    });

    let knowledge = client(&server).get_knowledge("ACME").unwrap();
    assert_eq!(knowledge.records.len(), 2);
    assert!(knowledge.records[1].accession_id.is_none());
    assert_eq!(knowledge.cross_refs.len(), 2);
    let keys: Vec<&str> = knowledge.cross_refs.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["0001-26-2", "10-Q|2019-05-01"]);
}

#[test]
fn test_status_mapping() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/filings/DOWN");
        then.status(503).body("maintenance");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/filings/BAD");
        then.status(422).body("unknown subject");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/filings/LOCKED");
        then.status(401).body("token expired");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/filings/GARBLED");
        then.status(200).body("<html>");
    });

    let client = client(&server);
    assert_eq!(
        client.get_filings("DOWN").unwrap_err(),
        ClientError::Http(503, "maintenance".into())
    );
    assert_eq!(
        client.get_filings("BAD").unwrap_err(),
        ClientError::Validation("unknown subject".into())
    );
    assert_eq!(
        client.get_filings("LOCKED").unwrap_err(),
        ClientError::AuthRejected(401, "token expired".into())
    );
    assert!(matches!(client.get_filings("GARBLED"), Err(ClientError::Parse(_))));
}

#[test]
fn test_unreachable_server_is_network_error() {
    // Nothing listens on port 9 of localhost in a test sandbox.
    let client = FeedClient::new("http://127.0.0.1:9", DEFAULT_TIMEOUT).unwrap();
    assert!(matches!(client.get_filings("ACME"), Err(ClientError::Network(_))));
}

#[test]
fn test_source_traits_return_fetch_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/filings/ACME");
        then.status(502).body("bad gateway");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/knowledge/ACME");
        then.status(200).json_body(json!({ "records": [] }));
    });

    let client = client(&server);
    let feed: &dyn FilingFeed = &client;
    let err: FetchError = feed.fetch_filings("ACME").unwrap_err();
    assert_eq!(err.status, Some(502));

    let records: &dyn RecordSource = &client;
    let knowledge = records.fetch_knowledge("ACME").unwrap();
    assert!(knowledge.cross_refs.is_empty());
}

#[test]
fn test_analysis_request_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/analysis").json_body(json!({
            "documentUrl": "https://docs.test/1.htm",
            "formType": "8-K",
            "description": "Current report",
            "filingDate": "2026-02-01"
        }));
        then.status(200).json_body(json!({
            "analysis": "[VERDICT: low] — routine officer change"
        }));
    });

    let request = AnalysisRequest {
        document_url: "https://docs.test/1.htm".into(),
        form_type: "8-K".into(),
        description: "Current report".into(),
        filing_date: "2026-02-01".into(),
    };
    let text = client(&server).analyze(&request).unwrap();
    mock.assert();
    assert!(text.starts_with("[VERDICT: low]"));
}

#[test]
fn test_patch_preview_then_commit() {
    let server = MockServer::start();
    let preview_mock = server.mock(|when, then| {
        when.method(POST).path("/api/patches/preview").json_body(json!({
            "subject": "ACME",
            "analysis": "text",
            "dryRun": true
        }));
        then.status(200).json_body(json!({
            "changeCount": 1,
            "files": [{"path": "data/acme/filings.json", "valid": true}],
            "diff": "+ 8-K 2026-02-01",
            "patches": [{"file": "data/acme/filings.json", "op": "append"}]
        }));
    });
    let commit_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/patches/commit")
            .header("authorization", "Bearer tok")
            .json_body(json!({
                "subject": "ACME",
                "patches": [{"file": "data/acme/filings.json", "op": "append"}],
                "dryRun": false
            }));
        then.status(200).json_body(json!({ "summary": "1 file updated" }));
    });

    let client = client(&server).with_token(Some("tok".into()));
    let preview = client.preview_patch("acme", "text").unwrap();
    assert_eq!(preview.change_count, 1);
    assert_eq!(preview.invalid_files().count(), 0);

    let summary = client.commit_patch("acme", &preview.patches).unwrap();
    assert_eq!(summary, "1 file updated");
    preview_mock.assert();
    commit_mock.assert();
}

#[test]
fn test_commit_requires_credentials() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/patches/commit");
        then.status(200).json_body(json!({ "summary": "should not happen" }));
    });

    let err = client(&server).commit_patch("ACME", &[]).unwrap_err();
    assert_eq!(err, ClientError::NotAuthenticated);
    mock.assert_hits(0);
}

#[test]
fn test_feed_drives_a_session() {
    use chrono::Utc;
    use filingdesk_recon::{FeedCache, KnowledgeBase, MemoryStore, ReconSession};

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/filings/ACME");
        then.status(200).json_body(json!({
            "filings": [{"accessionId": "0001-26-1", "filingDate": "2026-02-01", "formType": "8-K"}]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/knowledge/ACME");
        then.status(500).body("db offline");
    });

    let client = client(&server);
    let mut session = ReconSession::new("ACME", KnowledgeBase::default(), FeedCache::new(MemoryStore::new()));
    let outcome = session.load(&client, &client, Utc::now()).unwrap();
    assert!(!outcome.knowledge_refreshed);
    assert_eq!(outcome.results[0].status, MatchStatus::New);
}
