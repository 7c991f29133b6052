//! End-to-end tests for the conversion pipeline
//!
//! Each test drives the whole chain from narrative text to the final
//! bundle document: extraction, terminology mapping, record building,
//! assembly, and validation.

use scribe::config::ScribeConfig;
use scribe::core::pipeline::ConversionPipeline;
use serde_json::Value;

fn pipeline() -> ConversionPipeline {
    ConversionPipeline::from_config(&ScribeConfig::default()).expect("pipeline from defaults")
}

fn entries(doc: &Value) -> &Vec<Value> {
    doc["entry"].as_array().expect("entry array")
}

fn find_entry<'a>(doc: &'a Value, resource_type: &str) -> Option<&'a Value> {
    entries(doc)
        .iter()
        .find(|e| e["resource"]["resourceType"] == resource_type)
}

#[tokio::test]
async fn test_patient_with_coded_medication_order() {
    let outcome = pipeline()
        .convert("Patient: jane doe needs cisplatin 80mg/m² IV daily", None)
        .await
        .unwrap();

    let doc = outcome.bundle.to_json();
    assert_eq!(doc["resourceType"], "Bundle");
    assert_eq!(doc["type"], "transaction");

    let patient = find_entry(&doc, "Patient").expect("patient entry");
    let name = patient["resource"]["name"][0]["text"].as_str().unwrap();
    assert!(name.to_lowercase().contains("jane doe"));

    let order = find_entry(&doc, "MedicationRequest").expect("order entry");
    let coding = &order["resource"]["medicationCodeableConcept"]["coding"][0];
    assert_eq!(coding["system"], "http://www.nlm.nih.gov/research/umls/rxnorm");
    assert!(!coding["code"].as_str().unwrap().is_empty());

    // The order references the patient through its anchor, and the
    // patient entry comes first.
    assert_eq!(order["resource"]["subject"]["reference"], patient["fullUrl"]);
    let doc_entries = entries(&doc);
    let patient_idx = doc_entries
        .iter()
        .position(|e| e["resource"]["resourceType"] == "Patient")
        .unwrap();
    let order_idx = doc_entries
        .iter()
        .position(|e| e["resource"]["resourceType"] == "MedicationRequest")
        .unwrap();
    assert!(patient_idx < order_idx);
}

#[tokio::test]
async fn test_unknown_vocabulary_degrades_to_free_text() {
    let outcome = pipeline()
        .convert("give the patient zz-compound-9 now", None)
        .await
        .unwrap();

    let doc = outcome.bundle.to_json();
    let order = find_entry(&doc, "MedicationRequest").expect("order entry");
    let concept = &order["resource"]["medicationCodeableConcept"];

    assert_eq!(concept["text"], "zz-compound-9");
    assert!(concept.get("coding").is_none());
}

#[tokio::test]
async fn test_multiple_medications_in_one_sentence() {
    let outcome = pipeline()
        .convert(
            "Started cisplatin 80mg/m² IV, followed by carboplatin AUC 6. Order CBC and CMP.",
            None,
        )
        .await
        .unwrap();

    let doc = outcome.bundle.to_json();
    let orders: Vec<_> = entries(&doc)
        .iter()
        .filter(|e| e["resource"]["resourceType"] == "MedicationRequest")
        .collect();
    assert_eq!(orders.len(), 2);

    let codes: Vec<&str> = orders
        .iter()
        .map(|o| {
            o["resource"]["medicationCodeableConcept"]["coding"][0]["code"]
                .as_str()
                .unwrap()
        })
        .collect();
    assert!(codes.contains(&"2555"), "cisplatin missing: {codes:?}");
    assert!(codes.contains(&"40048"), "carboplatin missing: {codes:?}");

    let labs: Vec<_> = entries(&doc)
        .iter()
        .filter(|e| e["resource"]["resourceType"] == "ServiceRequest")
        .collect();
    assert!(labs.len() >= 2, "expected CBC and CMP orders, got {}", labs.len());
}

#[tokio::test]
async fn test_every_internal_reference_points_backwards() {
    let outcome = pipeline()
        .convert(
            "Patient: John Smith. Gave furosemide 40mg IV. Placed foley catheter. Order CBC.",
            None,
        )
        .await
        .unwrap();

    let doc = outcome.bundle.to_json();
    let doc_entries = entries(&doc);
    let urls: Vec<&str> = doc_entries
        .iter()
        .map(|e| e["fullUrl"].as_str().unwrap())
        .collect();

    for (i, entry) in doc_entries.iter().enumerate() {
        let resource = entry["resource"].as_object().unwrap();
        for value in resource.values() {
            let Some(reference) = value.get("reference").and_then(Value::as_str) else {
                continue;
            };
            if reference.starts_with("urn:uuid:") {
                let target = urls
                    .iter()
                    .position(|u| *u == reference)
                    .expect("internal reference targets an entry");
                assert!(target <= i, "entry {i} references later entry {target}");
            }
        }
    }
}

#[tokio::test]
async fn test_extraction_is_deterministic() {
    let text = "Patient: jane doe needs cisplatin 80mg/m² IV daily, order CBC";
    let p = pipeline();

    let first = p.convert(text, None).await.unwrap();
    let second = p.convert(text, None).await.unwrap();

    assert_eq!(first.entities, second.entities);

    let types = |outcome: &scribe::core::pipeline::ConversionOutcome| -> Vec<String> {
        outcome
            .bundle
            .entries
            .iter()
            .map(|e| e.record.record_type.clone())
            .collect()
    };
    assert_eq!(types(&first), types(&second));
}

#[tokio::test]
async fn test_unrecognized_text_yields_empty_bundle() {
    let outcome = pipeline()
        .convert("the weather was pleasant and nothing else happened", None)
        .await
        .unwrap();

    assert!(outcome.bundle.is_empty());
    assert!(outcome.report.is_clean());
}

#[tokio::test]
async fn test_request_id_is_carried_into_report() {
    let outcome = pipeline()
        .convert("Patient: Jane Doe", Some("req-7"))
        .await
        .unwrap();
    assert_eq!(outcome.report.request_id.as_deref(), Some("req-7"));
}
