use crate::clarify::Question;
use crate::error::CoreResult;
use crate::filter::FilterOutcome;
use crate::mapper::ModuleMap;

/// One row per resource in identity order, whatever its bucket.
pub fn render_partition_csv(outcome: &FilterOutcome) -> CoreResult<String> {
    let mut rows: Vec<_> = outcome.iter().collect();
    rows.sort_by(|a, b| a.resource.identity.cmp(&b.resource.identity));

    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    wtr.write_record([
        "identity",
        "resource_type",
        "provider_type_code",
        "bucket",
        "reason",
        "merged_confidence",
        "evidence_ids",
    ])?;
    for row in rows {
        let r = &row.resource;
        wtr.write_record([
            r.identity.to_string(),
            r.resource_type.id.clone(),
            r.provider_type_code().unwrap_or_default().to_string(),
            row.decision.bucket().as_str().to_string(),
            row.decision
                .reason()
                .map(|x| x.as_str())
                .unwrap_or_default()
                .to_string(),
            format!("{:.6}", r.merged_confidence),
            r.evidence_ids().collect::<Vec<_>>().join(";"),
        ])?;
    }
    finish(wtr)
}

pub fn render_assignments_csv(map: &ModuleMap) -> CoreResult<String> {
    let mut rows = map.assignments.clone();
    rows.sort_by(|a, b| a.identity.cmp(&b.identity));

    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    wtr.write_record([
        "identity",
        "module_key",
        "common_modules",
        "embedded_capabilities",
    ])?;
    for row in rows {
        wtr.write_record([
            row.identity.to_string(),
            row.module_key,
            join(row.common_modules.iter()),
            join(row.embedded_capabilities.iter()),
        ])?;
    }
    finish(wtr)
}

pub fn render_common_modules_csv(map: &ModuleMap) -> CoreResult<String> {
    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    wtr.write_record(["module_key", "usage_count", "used_by"])?;
    for c in &map.common_modules {
        wtr.write_record([
            c.module_key.clone(),
            c.usage_count.to_string(),
            join(c.used_by.iter().map(|i| i.to_string())),
        ])?;
    }
    finish(wtr)
}

pub fn render_questions_markdown(questions: &[Question]) -> String {
    let mut sorted = questions.to_vec();
    sorted.sort_by(|a, b| a.identity.cmp(&b.identity));

    let mut out = Vec::new();
    out.push("# Open Questions".to_string());
    out.push("".to_string());
    if sorted.is_empty() {
        out.push("- [x] Nothing needs clarification.".to_string());
        out.push("".to_string());
        return out.join("\n");
    }
    for q in sorted {
        out.push(format!("- [ ] `{}` ({}): {}", q.identity, q.reason, q.prompt));
        if !q.candidate_types.is_empty() {
            out.push(format!("  - candidates: {}", q.candidate_types.join(", ")));
        }
    }
    out.push("".to_string());
    out.join("\n")
}

fn join<S: AsRef<str>>(items: impl Iterator<Item = S>) -> String {
    items.map(|s| s.as_ref().to_string()).collect::<Vec<_>>().join(";")
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> CoreResult<String> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).replace("\r\n", "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommonModule, IdentityKey, ModuleAssignment};
    use std::collections::BTreeSet;

    #[test]
    fn common_modules_csv_lists_users() {
        let a = IdentityKey::coded("vm", "p/vm");
        let b = IdentityKey::coded("db", "p/db");
        let map = ModuleMap {
            assignments: vec![ModuleAssignment {
                identity: a.clone(),
                module_key: "p-vm".to_string(),
                embedded_capabilities: BTreeSet::new(),
                common_modules: BTreeSet::from(["private-endpoint".to_string()]),
            }],
            common_modules: vec![CommonModule {
                module_key: "private-endpoint".to_string(),
                usage_count: 2,
                used_by: BTreeSet::from([a, b]),
            }],
            diagnostics: Vec::new(),
        };
        let csv = render_common_modules_csv(&map).unwrap();
        assert_eq!(
            csv,
            "module_key,usage_count,used_by\nprivate-endpoint,2,db|p/db;vm|p/vm\n"
        );
        let assignments = render_assignments_csv(&map).unwrap();
        assert!(assignments.ends_with("vm|p/vm,p-vm,private-endpoint,\n"));
    }

    #[test]
    fn empty_question_list_renders_checked_box() {
        assert!(render_questions_markdown(&[]).contains("- [x] Nothing needs clarification."));
    }
}
