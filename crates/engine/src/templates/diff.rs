use rolescope_common::types::{DiffSummary, FieldDiff, FieldDiffStatus, PromptTemplate, TemplateDiff};

const TEXT_FIELDS: [&str; 2] = ["prompt_text", "description"];

/// Field-by-field diff between two template version snapshots (§4.6).
/// `a`/`b` carry the full content of each version, so no history replay is
/// needed to compute it.
pub fn compute_diff(a: &impl TemplateSnapshot, b: &impl TemplateSnapshot) -> TemplateDiff {
    let mut fields = Vec::new();
    let mut summary = DiffSummary::default();

    fields.push(scalar_diff("name", Some(a.name()), Some(b.name())));
    fields.push(scalar_diff("category", Some(a.category()), Some(b.category())));
    let (prompt_diff, prompt_summary) = text_diff("prompt_text", a.prompt_text(), b.prompt_text());
    fields.push(prompt_diff);
    accumulate(&mut summary, &prompt_summary);

    let (desc_diff, desc_summary) = text_diff(
        "description",
        a.description().unwrap_or(""),
        b.description().unwrap_or(""),
    );
    fields.push(desc_diff);
    accumulate(&mut summary, &desc_summary);

    fields.push(scalar_diff(
        "metadata",
        (a.metadata() != serde_json::Value::Null).then(|| a.metadata().to_string()).as_deref(),
        (b.metadata() != serde_json::Value::Null).then(|| b.metadata().to_string()).as_deref(),
    ));

    TemplateDiff { fields, summary }
}

/// Content accessors shared by a live `PromptTemplate` head and a
/// `TemplateVersionHistory` snapshot, so the diff engine works on either.
pub trait TemplateSnapshot {
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn prompt_text(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn metadata(&self) -> &serde_json::Value;
}

impl TemplateSnapshot for PromptTemplate {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn prompt_text(&self) -> &str {
        &self.prompt_text
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
}

impl TemplateSnapshot for rolescope_common::types::TemplateVersionHistory {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn prompt_text(&self) -> &str {
        &self.prompt_text
    }
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
}

fn scalar_diff(field: &str, a: Option<&str>, b: Option<&str>) -> FieldDiff {
    let status = match (a, b) {
        (None, None) => FieldDiffStatus::Unchanged,
        (None, Some(_)) => FieldDiffStatus::Added,
        (Some(_), None) => FieldDiffStatus::Removed,
        (Some(x), Some(y)) if x == y => FieldDiffStatus::Unchanged,
        (Some(_), Some(_)) => FieldDiffStatus::Modified,
    };
    FieldDiff {
        field: field.to_string(),
        status,
        unified_diff: None,
        value_a: a.map(str::to_string),
        value_b: b.map(str::to_string),
    }
}

fn text_diff(field: &str, a: &str, b: &str) -> (FieldDiff, DiffSummary) {
    debug_assert!(TEXT_FIELDS.contains(&field));
    if a == b {
        return (
            FieldDiff {
                field: field.to_string(),
                status: FieldDiffStatus::Unchanged,
                unified_diff: None,
                value_a: None,
                value_b: None,
            },
            DiffSummary::default(),
        );
    }

    let ops = line_diff(a, b);
    let (rendered, summary) = render_unified(&ops);
    let status = if a.is_empty() {
        FieldDiffStatus::Added
    } else if b.is_empty() {
        FieldDiffStatus::Removed
    } else {
        FieldDiffStatus::Modified
    };

    (
        FieldDiff {
            field: field.to_string(),
            status,
            unified_diff: Some(rendered),
            value_a: None,
            value_b: None,
        },
        summary,
    )
}

fn accumulate(total: &mut DiffSummary, part: &DiffSummary) {
    total.additions += part.additions;
    total.deletions += part.deletions;
    total.modifications += part.modifications;
}

enum LineOp<'a> {
    Equal(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

/// Longest-common-subsequence line diff. Quadratic in line count, which is
/// fine for prompt-sized text; not meant for large files.
fn line_diff<'a>(a: &'a str, b: &'a str) -> Vec<LineOp<'a>> {
    let a_lines: Vec<&str> = a.lines().collect();
    let b_lines: Vec<&str> = b.lines().collect();

    let n = a_lines.len();
    let m = b_lines.len();
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a_lines[i] == b_lines[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a_lines[i] == b_lines[j] {
            ops.push(LineOp::Equal(a_lines[i]));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            ops.push(LineOp::Delete(a_lines[i]));
            i += 1;
        } else {
            ops.push(LineOp::Insert(b_lines[j]));
            j += 1;
        }
    }
    while i < n {
        ops.push(LineOp::Delete(a_lines[i]));
        i += 1;
    }
    while j < m {
        ops.push(LineOp::Insert(b_lines[j]));
        j += 1;
    }
    ops
}

/// Render diff ops as a unified-style text block, pairing up adjacent
/// delete/insert runs as "modifications" rather than counting them as a
/// deletion plus an unrelated addition.
fn render_unified(ops: &[LineOp]) -> (String, DiffSummary) {
    let mut out = String::new();
    let mut summary = DiffSummary::default();
    let mut i = 0;

    while i < ops.len() {
        match &ops[i] {
            LineOp::Equal(line) => {
                out.push_str(&format!("  {}\n", line));
                i += 1;
            }
            LineOp::Delete(_) | LineOp::Insert(_) => {
                let mut deletes = Vec::new();
                let mut inserts = Vec::new();
                while i < ops.len() {
                    match &ops[i] {
                        LineOp::Delete(l) => {
                            deletes.push(*l);
                            i += 1;
                        }
                        LineOp::Insert(l) => {
                            inserts.push(*l);
                            i += 1;
                        }
                        LineOp::Equal(_) => break,
                    }
                }
                let paired = deletes.len().min(inserts.len());
                for k in 0..paired {
                    out.push_str(&format!("- {}\n", deletes[k]));
                    out.push_str(&format!("+ {}\n", inserts[k]));
                }
                for l in &deletes[paired..] {
                    out.push_str(&format!("- {}\n", l));
                }
                for l in &inserts[paired..] {
                    out.push_str(&format!("+ {}\n", l));
                }
                summary.modifications += paired as u32;
                summary.deletions += (deletes.len() - paired) as u32;
                summary.additions += (inserts.len() - paired) as u32;
            }
        }
    }

    (out, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_yields_unchanged_with_no_diff_body() {
        let (diff, summary) = text_diff("prompt_text", "hello\nworld", "hello\nworld");
        assert_eq!(diff.status, FieldDiffStatus::Unchanged);
        assert!(diff.unified_diff.is_none());
        assert_eq!(summary.modifications, 0);
    }

    #[test]
    fn single_line_change_counts_as_one_modification() {
        let (_, summary) = text_diff("prompt_text", "line one\nline two", "line one\nline TWO");
        assert_eq!(summary.modifications, 1);
        assert_eq!(summary.additions, 0);
        assert_eq!(summary.deletions, 0);
    }

    #[test]
    fn pure_addition_counts_as_addition_only() {
        let (_, summary) = text_diff("prompt_text", "line one", "line one\nline two");
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.modifications, 0);
    }

    #[test]
    fn compare_is_symmetric_with_swapped_added_removed() {
        let a = PromptTemplate::new("A".into(), "CTO".into(), "hello\nworld".into());
        let mut b = a.clone();
        b.prompt_text = "hello\nthere".into();

        let forward = compute_diff(&a, &b);
        let backward = compute_diff(&b, &a);

        let forward_prompt = forward.fields.iter().find(|f| f.field == "prompt_text").unwrap();
        let backward_prompt = backward.fields.iter().find(|f| f.field == "prompt_text").unwrap();
        assert_eq!(forward.summary.modifications, backward.summary.modifications);
        assert_eq!(forward_prompt.status, backward_prompt.status);
    }
}
