use archgraph_core::capability::{CatalogEntry, CatalogFile, TypeCatalog, TypeResolver};
use archgraph_core::config::PipelineConfig;
use archgraph_core::error::CoreResult;
use archgraph_core::mapper::RequirementAnnotations;
use archgraph_core::merge::ConfidenceStrategy;
use archgraph_core::model::{DetectorOutput, IdentityKey, Position, SourceKind};
use archgraph_core::normalize::Normalizer;
use archgraph_core::pipeline::Pipeline;
use std::collections::{BTreeMap, BTreeSet};

fn catalog() -> TypeCatalog {
    TypeCatalog::from_file(CatalogFile {
        entries: vec![
            CatalogEntry {
                resource_type: "virtual-machine".to_string(),
                aliases: vec!["vm".to_string(), "Virtual Machine".to_string()],
                provider_type_code: Some("Microsoft.Compute/virtualMachines".to_string()),
            },
            CatalogEntry {
                resource_type: "key-vault".to_string(),
                aliases: vec!["kv".to_string()],
                provider_type_code: Some("Microsoft.KeyVault/vaults".to_string()),
            },
            CatalogEntry {
                resource_type: "dns-zone".to_string(),
                aliases: Vec::new(),
                provider_type_code: Some("Microsoft.Network/dnsZones".to_string()),
            },
            CatalogEntry {
                resource_type: "queue".to_string(),
                aliases: vec!["message queue".to_string()],
                provider_type_code: None,
            },
        ],
        extra_valid_provider_types: vec!["Microsoft.Storage/storageAccounts/queueServices".to_string()],
        open_world: false,
    })
    .unwrap()
}

// A fixed but irregular spread of detections: repeated labels, clustered and
// scattered positions, every source, confidences across all filter ranges.
fn detections() -> Vec<DetectorOutput> {
    let labels = ["VM", "Virtual Machine", "kv", "Message Queue", "queue", "mystery", ""];
    let sources = [SourceKind::Vision, SourceKind::Text, SourceKind::Narrative];
    let mut out = Vec::new();
    for i in 0..42usize {
        let label = labels[i % labels.len()];
        let x = ((i * 37) % 9) as f64 * 15.0;
        let y = ((i * 11) % 4) as f64 * 60.0;
        out.push(DetectorOutput {
            position: Position::new(x, y),
            raw_resource_label: label.to_string(),
            provider_type_code: String::new(),
            confidence: ((i * 13) % 20) as f64 / 19.0,
            source: sources[i % sources.len()],
            raw_evidence: format!("detection {}", i),
            category: None,
        });
    }
    out.push(DetectorOutput {
        position: Position::new(900.0, 900.0),
        raw_resource_label: "DNS Zone".to_string(),
        provider_type_code: String::new(),
        confidence: 0.05,
        source: SourceKind::Narrative,
        raw_evidence: "mentioned once in passing".to_string(),
        category: Some("Networking".to_string()),
    });
    out
}

#[test]
fn identities_are_unique_across_all_buckets() {
    let c = catalog();
    let pipeline = Pipeline::new(PipelineConfig::default(), &c, &c).unwrap();
    let report = pipeline.run(&detections()).unwrap();

    let identities: Vec<&IdentityKey> = report.outcome.iter().map(|f| &f.resource.identity).collect();
    let distinct: BTreeSet<&IdentityKey> = identities.iter().copied().collect();
    assert_eq!(identities.len(), distinct.len());
}

#[test]
fn every_evidence_record_lands_in_exactly_one_bucket() {
    let c = catalog();
    let pipeline = Pipeline::new(PipelineConfig::default(), &c, &c).unwrap();
    let input = detections();
    let report = pipeline.run(&input).unwrap();

    let fate = report.evidence_fate();
    assert_eq!(fate.len(), input.len());
    assert_eq!(report.evidence_count, input.len());
    let ids: BTreeSet<&str> = fate.iter().map(|f| f.evidence_id.as_str()).collect();
    assert_eq!(ids.len(), input.len());
    for f in &fate {
        assert_eq!(report.outcome.bucket_of(&f.identity), Some(f.bucket));
    }
}

#[test]
fn partition_covers_the_merged_set() {
    let c = catalog();
    let pipeline = Pipeline::new(PipelineConfig::default(), &c, &c).unwrap();
    let report = pipeline.run(&detections()).unwrap();

    let merged_events = report.audit.count("RESOURCE_MERGED");
    assert_eq!(report.outcome.len(), merged_events);
    let decided = report.audit.count("RESOURCE_ACCEPTED")
        + report.audit.count("RESOURCE_REJECTED")
        + report.audit.count("CLARIFICATION_REQUIRED");
    assert_eq!(decided, merged_events);
    assert!(!report.outcome.accepted.is_empty());
    assert!(!report.outcome.rejected.is_empty());
    assert!(!report.outcome.needs_clarification.is_empty());
}

#[test]
fn merged_confidence_never_drops_below_its_best_evidence() {
    let c = catalog();
    for strategy in [ConfidenceStrategy::Max, ConfidenceStrategy::NoisyOr] {
        let config = PipelineConfig {
            confidence_strategy: strategy,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(config, &c, &c).unwrap();
        let report = pipeline.run(&detections()).unwrap();
        for item in report.outcome.iter() {
            let r = &item.resource;
            assert!(r.merged_confidence >= r.max_evidence_confidence());
            assert!(r.merged_confidence <= 1.0);
        }
    }
}

#[test]
fn common_modules_respect_the_configured_threshold() {
    let c = catalog();
    let config = PipelineConfig {
        common_module_threshold: 3,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config, &c, &c).unwrap();
    let mut report = pipeline.run(&detections()).unwrap();

    let accepted: Vec<IdentityKey> = report
        .outcome
        .accepted
        .iter()
        .map(|f| f.resource.identity.clone())
        .collect();
    let mut annotations = RequirementAnnotations::new();
    for (i, id) in accepted.iter().enumerate() {
        annotations.insert(id.clone(), "requires-rbac-assignment");
        if i == 0 {
            annotations.insert(id.clone(), "requires-diagnostic-logging");
        }
    }

    let map = pipeline.map_modules(&mut report, &annotations).unwrap();
    for cm in &map.common_modules {
        assert!(cm.usage_count >= 3);
        assert_eq!(cm.usage_count, cm.used_by.len());
    }
    assert!(map.common_module("requires-diagnostic-logging").is_none());
    assert_eq!(
        map.common_module("requires-rbac-assignment").is_some(),
        accepted.len() >= 3
    );
}

#[test]
fn arrival_order_does_not_change_the_partition() {
    let c = catalog();
    let pipeline = Pipeline::new(PipelineConfig::default(), &c, &c).unwrap();
    let forward = detections();
    let mut backward = forward.clone();
    backward.reverse();

    let a = pipeline.run(&forward).unwrap();
    let b = pipeline.run(&backward).unwrap();
    assert_eq!(a.run_id, b.run_id);

    let shape = |r: &archgraph_core::pipeline::PipelineReport| -> BTreeMap<IdentityKey, (String, usize)> {
        r.outcome
            .iter()
            .map(|f| {
                (
                    f.resource.identity.clone(),
                    (f.decision.bucket().as_str().to_string(), f.resource.evidence.len()),
                )
            })
            .collect()
    };
    assert_eq!(shape(&a), shape(&b));
}

// Resolver whose aliases chain and loop: a -> b -> c -> b, d -> d.
struct LoopyResolver;

impl TypeResolver for LoopyResolver {
    fn canonical_type(&self, label: &str) -> CoreResult<Option<String>> {
        Ok(match label {
            "a" => Some("b".to_string()),
            "b" => Some("c".to_string()),
            "c" => Some("b".to_string()),
            "d" => Some("d".to_string()),
            "e" => Some("Unknown".to_string()),
            _ => None,
        })
    }

    fn resolve_provider_type(&self, _resource_type: &str) -> CoreResult<Option<String>> {
        Ok(None)
    }
}

#[test]
fn normalization_is_idempotent() {
    let loopy = Normalizer::new(LoopyResolver);
    let c = catalog();
    let cataloged = Normalizer::new(&c);
    let labels = ["a", "B", "c", "d", "e", "zzz", "", "  VM ", "Virtual Machine", "unknown", "KV!!"];
    for label in labels {
        let once = loopy.normalize(label);
        assert_eq!(loopy.normalize(&once.id), once, "loopy resolver, label {:?}", label);
        let once = cataloged.normalize(label);
        assert_eq!(cataloged.normalize(&once.id), once, "catalog, label {:?}", label);
    }
    assert_eq!(loopy.normalize("a").id, "b");
    assert!(loopy.normalize("e").is_unknown());
    assert_eq!(cataloged.normalize("Virtual Machine").id, "virtual-machine");
}
