use playground_backend::{BackendError, MockBackend, UpliftResult};
use playground_uplift::{
    FETCH_FAILED, InputSource, Pipeline, PipelineStatus, StepServices, StepType, URL_REQUIRED,
    decode_pipeline, hash_params, STEPS_PARAM,
};
use serde_json::json;
use std::sync::Arc;

fn services(backend: &MockBackend) -> StepServices {
    StepServices::from_backend(Arc::new(backend.clone()))
}

fn playground(input: &str, context: &str) -> Pipeline {
    let mut pipeline = Pipeline::playground();
    pipeline
        .step_mut(0)
        .expect("input step should exist")
        .set_contents(input);
    pipeline
        .step_mut(1)
        .expect("uplift step should exist")
        .set_contents(context);
    pipeline
}

#[tokio::test(flavor = "current_thread")]
async fn pipeline_prose_input_expected_parse_error_on_input_step() {
    let backend = MockBackend::new();
    let mut pipeline = playground("not json", "transform: '.'");

    let result = pipeline.run(&services(&backend), false).await;

    assert_eq!(result.status, PipelineStatus::Fail);
    assert_eq!(result.failed_step, Some(0));
    let input = pipeline.step(0).expect("input step should exist");
    assert_eq!(input.errors(), ["Input data is not a valid JSON or YAML document"]);
    assert!(input.is_modified());
    assert!(!input.is_loading());
}

#[tokio::test(flavor = "current_thread")]
async fn pipeline_yaml_input_expected_document_passed_verbatim() {
    let backend = MockBackend::new();
    let mut pipeline = playground("name: x\ntags: [a, b]\n", "transform: '.'");

    let result = pipeline.run(&services(&backend), false).await;

    assert!(result.is_success());
    let calls = backend.uplift_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].json_doc, "name: x\ntags: [a, b]\n");
    assert_eq!(calls[0].context, "transform: '.'");
}

#[tokio::test(flavor = "current_thread")]
async fn pipeline_uplift_url_source_empty_url_expected_no_conversion() {
    let backend = MockBackend::new();
    let mut pipeline = playground("{\"a\":1}", "");
    pipeline
        .step_mut(1)
        .expect("uplift step should exist")
        .set_input_source(InputSource::Url)
        .expect("uplift step should accept a url source");

    let result = pipeline.run(&services(&backend), false).await;

    assert_eq!(result.failed_step, Some(1));
    assert_eq!(result.errors, vec![URL_REQUIRED.to_string()]);
    assert!(backend.uplift_calls().is_empty());
    assert!(backend.fetch_calls().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn pipeline_remote_sources_expected_fetched_then_converted() {
    let backend = MockBackend::new()
        .with_document("https://example.org/input.json", "[{\"id\": 1}]")
        .with_document("https://example.org/context.yaml", "transform: '.[]'");
    backend.push_uplift_response(Ok(UpliftResult::from([
        ("json".to_string(), "{\"@graph\": []}".to_string()),
        ("ttl".to_string(), "".to_string()),
    ])));
    let mut pipeline = Pipeline::playground();
    for (index, url) in [
        (0, "https://example.org/input.json"),
        (1, "https://example.org/context.yaml"),
    ] {
        let step = pipeline.step_mut(index).expect("step should exist");
        step.set_input_source(InputSource::Url)
            .expect("step should accept a url source");
        step.set_url(Some(url.to_string()))
            .expect("step should accept a url");
    }

    let result = pipeline.run(&services(&backend), false).await;

    assert!(result.is_success(), "run failed: {:?}", result.errors);
    assert_eq!(backend.fetch_calls().len(), 2);
    let calls = backend.uplift_calls();
    assert_eq!(calls[0].json_doc, "[{\"id\": 1}]");
    assert_eq!(calls[0].context, "transform: '.[]'");
    let output = pipeline.output().expect("pipeline should have output");
    assert_eq!(output.format("json"), Some("{\"@graph\": []}"));
}

#[tokio::test(flavor = "current_thread")]
async fn pipeline_fetch_failure_expected_generic_message() {
    let backend = MockBackend::new().with_fetch_error(
        "https://example.org/input.json",
        BackendError::Status {
            status: 404,
            body: "not found".to_string(),
        },
    );
    let mut pipeline = Pipeline::playground();
    let input = pipeline.step_mut(0).expect("input step should exist");
    input
        .set_input_source(InputSource::Url)
        .expect("input step should accept a url source");
    input
        .set_url(Some("https://example.org/input.json".to_string()))
        .expect("input step should accept a url");

    let result = pipeline.run(&services(&backend), false).await;

    assert_eq!(result.failed_step, Some(0));
    assert_eq!(result.errors, vec![FETCH_FAILED.to_string()]);
}

#[tokio::test(flavor = "current_thread")]
async fn pipeline_server_detail_error_expected_detail_message() {
    let backend = MockBackend::new();
    backend.push_uplift_response(Err(BackendError::Status {
        status: 422,
        body: json!({
            "detail": { "type": "ContextError", "msg": "Bad context", "cause": "yaml|malformed syntax" }
        })
        .to_string(),
    }));
    let mut pipeline = playground("{}", "transform: [");

    let result = pipeline.run(&services(&backend), false).await;

    assert_eq!(result.failed_step, Some(1));
    assert_eq!(result.errors, vec!["Bad context: malformed syntax".to_string()]);
    assert!(pipeline.step(1).expect("uplift step should exist").is_pending());
}

#[test]
fn pipeline_share_fragment_expected_revived_pipeline() {
    let pipeline = playground("{\"a\":1}", "transform: '.'");

    let fragment = pipeline
        .share_fragment("/uplift")
        .expect("fragment should encode");
    let params = hash_params(&fragment);
    let records = decode_pipeline(&params[STEPS_PARAM]).expect("steps param should decode");
    assert_eq!(records.len(), 3);
    assert!(!records[0].contains_key("url"));

    let revived = Pipeline::from_fragment(&fragment).expect("fragment should revive");
    let input = revived.step(0).expect("input step should exist");
    assert_eq!(input.step_type(), StepType::Input);
    assert_eq!(input.contents(), "{\"a\":1}");
    assert_eq!(revived.step(1).map(|step| step.contents()), Some("transform: '.'"));
}

#[test]
fn pipeline_fragment_with_unknown_step_expected_error() {
    let fragment = playground_uplift::share_fragment(
        "/uplift",
        &[serde_json::from_value(json!({ "type": "ShellStep" })).expect("record should parse")],
    )
    .expect("fragment should encode");

    let error = Pipeline::from_fragment(&fragment).expect_err("unknown step should fail");
    assert_eq!(error.to_string(), "unknown class ShellStep");
}
