//! Trial log export: semicolon-delimited, UTF-8 with BOM, one row per trial.
//!
//! Column order is [`CSV_HEADERS`]. The table carries the derived
//! `error_type` label instead of the individual classifier flags;
//! [`parse_csv`] rebuilds the full [`TrialRecord`]s by replaying the
//! classifier over the rows against the session's reference deck, and checks
//! the replayed labels against the exported ones. Run and category counters
//! and rule changes must follow from the previous row.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::classifier::{classify, ErrorType};
use crate::config::SessionConfig;
use crate::constants::{CSV_COLUMN_COUNT, CSV_DELIMITER, CSV_HEADERS, NUM_REFERENCE_CARDS, UTF8_BOM};
use crate::error::{Result, WcstError};
use crate::rules::Evaluation;
use crate::session::TrialRecord;
use crate::stimulus::StimulusDomain;
use crate::types::{Card, Dimension, Rule};

/// Quote a field iff it contains the delimiter, a comma, a quote or a newline.
fn escape(field: &str) -> String {
    if field.contains([CSV_DELIMITER, ',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn label(domain: &StimulusDomain, dim: Dimension, card: &Card) -> String {
    domain
        .label(dim, card.attribute(dim))
        .unwrap_or_default()
        .to_string()
}

/// Serialize the log. `domain` supplies the stimulus attribute labels.
pub fn to_csv(rows: &[TrialRecord], domain: &StimulusDomain) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format!(
        "{}{}",
        UTF8_BOM,
        CSV_HEADERS.join(&CSV_DELIMITER.to_string())
    ));

    for r in rows {
        let fields: [String; CSV_COLUMN_COUNT] = [
            r.participant_id.clone(),
            r.session_id.clone(),
            r.trial_index.to_string(),
            label(domain, Dimension::Color, &r.stimulus),
            label(domain, Dimension::Shape, &r.stimulus),
            label(domain, Dimension::Number, &r.stimulus),
            r.selected_index.to_string(),
            r.correct.to_string(),
            r.error_type().as_str().to_string(),
            r.set_maintenance_error.to_string(),
            r.rule.to_string(),
            r.prev_rule.map(|p| p.to_string()).unwrap_or_default(),
            r.categories_completed.to_string(),
            r.consecutive_correct.to_string(),
            r.response_time_ms.to_string(),
            format_timestamp(&r.timestamp_utc),
            r.seed.to_string(),
            r.device_info.clone(),
            r.app_version.clone(),
        ];
        let escaped: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        lines.push(escaped.join(&CSV_DELIMITER.to_string()));
    }
    lines.join("\n")
}

pub fn write_csv(path: impl AsRef<Path>, rows: &[TrialRecord], domain: &StimulusDomain) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, to_csv(rows, domain))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "trial log exported");
    Ok(())
}

/// Split CSV text into records of fields, honoring quoted fields that contain
/// delimiters, doubled quotes or newlines. Returns (starting line, fields).
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            c if c == CSV_DELIMITER => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(WcstError::Csv {
            line: record_line,
            message: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((record_line, fields));
    }
    Ok(records)
}

fn csv_err(line: usize, message: impl Into<String>) -> WcstError {
    WcstError::Csv {
        line,
        message: message.into(),
    }
}

fn parse_field<T: std::str::FromStr>(line: usize, name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| csv_err(line, format!("{}: cannot parse {:?}", name, value)))
}

fn parse_attr(line: usize, domain: &StimulusDomain, dim: Dimension, value: &str) -> Result<u8> {
    domain
        .value_of(dim, value)
        .ok_or_else(|| csv_err(line, format!("unknown {} {:?}", dim, value)))
}

fn parse_rule(line: usize, value: &str) -> Result<Rule> {
    value.parse().map_err(|e: String| csv_err(line, e))
}

/// The run and category counters a row may carry given the row before it.
fn check_counters(
    line: usize,
    threshold: u32,
    prev_row: Option<&TrialRecord>,
    correct: bool,
    categories_completed: u32,
    consecutive_correct: u32,
) -> Result<()> {
    let cats_before = prev_row.map_or(0, |p| p.categories_completed);
    let run_before = prev_row.map_or(0, |p| p.consecutive_correct);
    let completes = correct && run_before + 1 >= threshold;

    let (expected_cats, expected_run) = match (correct, completes) {
        (true, true) => (cats_before + 1, 0),
        (true, false) => (cats_before, run_before + 1),
        (false, _) => (cats_before, 0),
    };
    if categories_completed != expected_cats {
        return Err(csv_err(
            line,
            format!("categories_completed {} (expected {})", categories_completed, expected_cats),
        ));
    }
    if consecutive_correct != expected_run {
        return Err(csv_err(
            line,
            format!("consecutive_correct {} (expected {})", consecutive_correct, expected_run),
        ));
    }
    Ok(())
}

/// The rule only changes on the row after a category completes, and the
/// finished rule becomes `prev_rule`.
fn check_rules(line: usize, prev_row: Option<&TrialRecord>, rule: Rule, prev_rule: Option<Rule>) -> Result<()> {
    let consistent = match prev_row {
        None => prev_rule.is_none(),
        Some(p) if p.categories_completed > p.category_index => {
            rule != p.rule && prev_rule == Some(p.rule)
        }
        Some(p) => rule == p.rule && prev_rule == p.prev_rule,
    };
    if consistent {
        Ok(())
    } else {
        Err(csv_err(line, "rule_in_force/prev_rule inconsistent with the previous row"))
    }
}

/// Parse an exported table back into trial records.
///
/// `config` must be the configuration the session ran under: it supplies the
/// attribute labels, the reference deck, and the classifier run lengths used
/// to re-derive the flags that are not stored as columns.
pub fn parse_csv(text: &str, config: &SessionConfig) -> Result<Vec<TrialRecord>> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut records = split_records(text)?.into_iter();

    let (header_line, header) = records
        .next()
        .ok_or_else(|| csv_err(1, "missing header"))?;
    if header != CSV_HEADERS {
        return Err(csv_err(header_line, "unexpected header"));
    }

    let domain = &config.domain;
    let reference = &config.reference_deck;
    let criteria = config.criteria();
    let mut rows: Vec<TrialRecord> = Vec::new();

    for (line, f) in records {
        if f.len() == 1 && f[0].is_empty() {
            continue;
        }
        if f.len() != CSV_COLUMN_COUNT {
            return Err(csv_err(
                line,
                format!("expected {} fields, got {}", CSV_COLUMN_COUNT, f.len()),
            ));
        }

        let trial_index: u32 = parse_field(line, "trial_index", &f[2])?;
        let stimulus = Card::new(
            parse_attr(line, domain, Dimension::Color, &f[3])?,
            parse_attr(line, domain, Dimension::Shape, &f[4])?,
            parse_attr(line, domain, Dimension::Number, &f[5])?,
        );
        let selected_index: usize = parse_field(line, "selected_key_index", &f[6])?;
        if selected_index >= NUM_REFERENCE_CARDS {
            return Err(csv_err(line, format!("selected_key_index {} out of range", selected_index)));
        }
        let correct: bool = parse_field(line, "correct", &f[7])?;
        let error_type = ErrorType::parse(&f[8])
            .ok_or_else(|| csv_err(line, format!("unknown error_type {:?}", f[8])))?;
        let set_maintenance_error: bool = parse_field(line, "set_maintenance_error", &f[9])?;
        let rule = parse_rule(line, &f[10])?;
        let prev_rule = if f[11].is_empty() {
            None
        } else {
            Some(parse_rule(line, &f[11])?)
        };
        let categories_completed: u32 = parse_field(line, "categories_completed", &f[12])?;
        let consecutive_correct: u32 = parse_field(line, "consecutive_correct", &f[13])?;
        let response_time_ms: f64 = parse_field(line, "response_time_ms", &f[14])?;
        let timestamp_utc = DateTime::parse_from_rfc3339(&f[15])
            .map_err(|e| csv_err(line, format!("timestamp_utc: {}", e)))?
            .with_timezone(&Utc);
        let seed: u64 = parse_field(line, "seed", &f[16])?;

        // Engine state before this trial is the previous row's state after it.
        let prev_row = rows.last();
        let expected_index = prev_row.map_or(0, |p| p.trial_index + 1);
        if trial_index != expected_index {
            return Err(csv_err(
                line,
                format!("trial_index {} out of sequence (expected {})", trial_index, expected_index),
            ));
        }
        let category_index = prev_row.map_or(0, |p| p.categories_completed);
        let run_before = prev_row.map_or(0, |p| p.consecutive_correct);
        let is_shift_trial = prev_row.is_some_and(|p| p.rule != rule);

        let target_index = reference.matching_index(&stimulus, rule);
        if correct != (selected_index == target_index) {
            return Err(csv_err(line, "correct flag inconsistent with rule_in_force"));
        }
        check_counters(
            line,
            config.category_threshold,
            prev_row,
            correct,
            categories_completed,
            consecutive_correct,
        )?;
        check_rules(line, prev_row, rule, prev_rule)?;

        let eval = Evaluation {
            rule,
            prev_rule,
            target_index,
            correct,
            run_before,
            consecutive_correct,
            categories_completed,
            category_index,
            is_shift_trial,
            category_completed: categories_completed > category_index,
        };
        let flags = classify(&criteria, reference, &stimulus, selected_index, &eval);
        if flags.error_type() != error_type || flags.set_maintenance_error != set_maintenance_error {
            return Err(csv_err(line, "error labels inconsistent with replayed classification"));
        }

        rows.push(TrialRecord {
            participant_id: f[0].clone(),
            session_id: f[1].clone(),
            trial_index,
            stimulus,
            selected_index,
            correct,
            is_perseverative_response: flags.is_perseverative_response,
            is_perseverative_error: flags.is_perseverative_error,
            is_non_perseverative_error: flags.is_non_perseverative_error,
            is_conceptual_response: flags.is_conceptual_response,
            set_maintenance_error,
            is_shift_trial,
            rule,
            prev_rule,
            categories_completed,
            consecutive_correct,
            category_index,
            response_time_ms,
            timestamp_utc,
            seed,
            device_info: f[17].clone(),
            app_version: f[18].clone(),
        });
    }
    Ok(rows)
}

pub fn read_csv(path: impl AsRef<Path>, config: &SessionConfig) -> Result<Vec<TrialRecord>> {
    let text = std::fs::read_to_string(path)?;
    parse_csv(&text, config)
}
