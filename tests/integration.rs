use pretty_assertions_sorted::assert_eq;
use serde_json::Value;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oci_moogsoft_shipper::config::Config;
use oci_moogsoft_shipper::process::InvocationReport;
use oci_moogsoft_shipper::Error;

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(format!("./tests/fixtures/{}", name)).unwrap()
}

// Loads configuration from the ambient environment (set per-test with
// temp_env), builds the real REST exporter, and runs one invocation.
async fn run_invocation(payload: Vec<u8>) -> Result<InvocationReport, Error> {
    let config = Config::load_from_env()?;
    let exporter = oci_moogsoft_shipper::set_up_moogsoft_exporter(&config)?;
    oci_moogsoft_shipper::function_handler(exporter, &config, &payload).await
}

#[test_log::test(tokio::test)]
async fn test_forwards_one_record_per_datapoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/metrics"))
        .and(header("apiKey", "test-token"))
        .respond_with(ResponseTemplate::new(202))
        .expect(3)
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1/metrics", server.uri());
    let report = temp_env::async_with_vars(
        [
            ("API_ENDPOINT", Some(endpoint.as_str())),
            ("API_TOKEN", Some("test-token")),
            ("TAG_KEYS", None),
            ("FORWARDING_ENABLED", Some("True")),
        ],
        run_invocation(fixture("oci_metrics.json")),
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 3);
    assert_eq!(report.delivered, 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);

    let bodies: Vec<Value> = requests
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect();

    // the two vcn datapoints share the batch-level fields
    let mirror_bytes: Vec<&Value> = bodies
        .iter()
        .filter(|body| body["source"] == "oci.vcn.vnic.from.network.mirror.bytes")
        .collect();
    assert_eq!(mirror_bytes.len(), 2);
    for body in &mirror_bytes {
        assert_eq!(body["metric"], "Mirrored Bytes from Network");
        assert_eq!(
            body["tags"],
            serde_json::json!([
                "name:VnicFromNetworkMirrorBytes",
                "namespace:oci_vcn",
                "displayName:Mirrored Bytes from Network",
                "unit:bytes"
            ])
        );
    }

    let cpu = bodies
        .iter()
        .find(|body| body["source"] == "oci.computeagent.cpu.utilization")
        .unwrap();
    assert_eq!(cpu["metric"], "CPU Utilization");
    assert_eq!(cpu["time"], 1652196612000i64);
    assert_eq!(cpu["data"], 17.3);
}

#[test_log::test(tokio::test)]
async fn test_forwarding_disabled_makes_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1/metrics", server.uri());
    let report = temp_env::async_with_vars(
        [
            ("API_ENDPOINT", Some(endpoint.as_str())),
            ("API_TOKEN", Some("test-token")),
            ("FORWARDING_ENABLED", Some("False")),
        ],
        run_invocation(fixture("oci_metrics.json")),
    )
    .await
    .unwrap();

    // the invocation still succeeds and exposes the would-be records
    assert_eq!(report.delivered, 0);
    assert_eq!(report.records.len(), 3);
    assert_eq!(
        report.records[0].source,
        "oci.vcn.vnic.from.network.mirror.bytes"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_rejected_record_does_not_stop_the_rest() {
    let server = MockServer::start().await;

    // the CPU record is rejected, everything else is accepted; mocks are
    // evaluated in mount order so the narrow one goes first
    Mock::given(method("POST"))
        .and(body_string_contains("oci.computeagent.cpu.utilization"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1/metrics", server.uri());
    let err = temp_env::async_with_vars(
        [
            ("API_ENDPOINT", Some(endpoint.as_str())),
            ("API_TOKEN", Some("test-token")),
            ("FORWARDING_ENABLED", Some("True")),
        ],
        run_invocation(fixture("oci_metrics.json")),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("oci.computeagent.cpu.utilization"));
    assert!(err.to_string().contains("503"));
    // all three records were still attempted
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_malformed_payload_forwards_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1/metrics", server.uri());
    let payload = br#"{"namespace": "oci_vcn", "name": "Bytes", "datapoints": "oops"}"#.to_vec();
    let err = temp_env::async_with_vars(
        [
            ("API_ENDPOINT", Some(endpoint.as_str())),
            ("API_TOKEN", Some("test-token")),
        ],
        run_invocation(payload),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("datapoints is not an array"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
