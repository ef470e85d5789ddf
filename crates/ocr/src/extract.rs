use regex::Regex;
use std::sync::OnceLock;

use crate::config::ExtractConfig;
use crate::confusion::{clean_digits, DIGITISH, DIGITISH_NO_SEP};
use crate::types::{ExtractedCreature, ExtractedField, HpReading, Transcript};

// ── Compiled regex cache ─────────────────────────────────────────────────────

fn re_cp_label() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        // Label variants the recognizer produces for the two-letter CP label,
        // collected from real misreads; up to three junk characters from
        // symbol misrecognition; then a digit-or-confusable blob.
        let pat = format!(
            r"(?i)\b(?:CP|CR|0P|OP|G)[^{d}A-Za-z]{{0,3}}([{d} ]{{2,12}})",
            d = DIGITISH
        );
        Regex::new(&pat).expect("invalid regex")
    })
}

fn re_digit_run() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        // 2+ digitish characters, embedded whitespace allowed — the
        // recognizer sometimes splits a number mid-string.
        let pat = format!(r"[{d}][{d} ]*[{d}]", d = DIGITISH);
        Regex::new(&pat).expect("invalid regex")
    })
}

fn re_ratio() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        let pat = format!(
            r"([{d}]{{2,4}})\s*[|/\\]\s*([{d}]{{2,4}})",
            d = DIGITISH_NO_SEP
        );
        Regex::new(&pat).expect("invalid regex")
    })
}

fn re_stardust_label() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        let pat = format!(
            r"(?i)(?:STARDUST|5TARDUST|STAROUST|SIARDUST)[^{d}]{{0,3}}([{d} ]{{3,9}})",
            d = DIGITISH
        );
        Regex::new(&pat).expect("invalid regex")
    })
}

fn re_time() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\b\d{1,2}:\d{2}\b").expect("invalid regex"))
}

// ── Phase 1: CP anchor ───────────────────────────────────────────────────────

/// A located CP anchor: the value, the transcript line it sits on, and how
/// much the strategy that found it trusts itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpHit {
    pub value: u32,
    pub line: usize,
    pub confidence: f32,
}

/// One way of locating the CP anchor. Strategies run in declared order and
/// the first hit wins; a strategy that finds nothing returns `None` rather
/// than guessing.
pub trait CpStrategy {
    fn attempt(&self, transcript: &Transcript, cfg: &ExtractConfig) -> Option<CpHit>;
}

/// Strategy A: a line carrying one of the known label variants followed by a
/// numeric blob. First in-bounds line in the leading window wins.
pub struct LabeledCpSearch;

impl CpStrategy for LabeledCpSearch {
    fn attempt(&self, transcript: &Transcript, cfg: &ExtractConfig) -> Option<CpHit> {
        for (i, line) in transcript.lines.iter().enumerate().take(cfg.lead_window) {
            let Some(caps) = re_cp_label().captures(&line.text) else {
                continue;
            };
            let Some(blob) = caps.get(1) else { continue };
            let cleaned = clean_digits(blob.as_str());
            let Ok(value) = cleaned.parse::<u32>() else {
                continue;
            };
            if cp_in_bounds(value, cfg) {
                return Some(CpHit { value, line: i, confidence: 0.9 });
            }
            // In-label but out-of-range capture (clock, day counter):
            // keep scanning, never accept.
            tracing::trace!(line = i, value, "labeled CP candidate out of bounds");
        }
        None
    }
}

/// Strategy B (fallback): any 2+ run of digit-or-confusable characters in the
/// leading window; the largest in-range value wins. Higher recall, lower
/// precision — only runs when the labeled search found nothing.
pub struct LargestBlobSearch;

impl CpStrategy for LargestBlobSearch {
    fn attempt(&self, transcript: &Transcript, cfg: &ExtractConfig) -> Option<CpHit> {
        let mut best: Option<CpHit> = None;
        for (i, line) in transcript.lines.iter().enumerate().take(cfg.lead_window) {
            // Clock readouts in the status bar look like in-range numbers
            // once the colon is gone; drop them before hunting for runs.
            let text = re_time().replace_all(&line.text, " ");
            for m in re_digit_run().find_iter(&text) {
                let cleaned = clean_digits(m.as_str());
                let Ok(value) = cleaned.parse::<u32>() else {
                    continue;
                };
                if !cp_in_bounds(value, cfg) {
                    continue;
                }
                if best.map_or(true, |b| value > b.value) {
                    best = Some(CpHit { value, line: i, confidence: 0.6 });
                }
            }
        }
        best
    }
}

fn cp_in_bounds(value: u32, cfg: &ExtractConfig) -> bool {
    value >= cfg.cp_min && value <= cfg.cp_max
}

// ── Phase 2: current/max ratio anchor ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioHit {
    pub reading: HpReading,
    pub line: usize,
}

/// Locate a `current/max` ratio (the HP readout) in a bounded window after
/// the CP anchor. Not every layout has one; absence is tolerated.
pub struct RatioSearch;

impl RatioSearch {
    pub fn attempt(
        &self,
        transcript: &Transcript,
        after: Option<usize>,
        cfg: &ExtractConfig,
    ) -> Option<RatioHit> {
        let start = after.map_or(0, |l| l + 1);
        for (i, line) in transcript
            .lines
            .iter()
            .enumerate()
            .skip(start)
            .take(cfg.hp_window)
        {
            let Some(caps) = re_ratio().captures(&line.text) else {
                continue;
            };
            let current = caps.get(1).map(|m| clean_digits(m.as_str()))?;
            let max = caps.get(2).map(|m| clean_digits(m.as_str()))?;
            let (Ok(current), Ok(max)) = (current.parse::<u32>(), max.parse::<u32>()) else {
                continue;
            };
            return Some(RatioHit { reading: HpReading { current, max }, line: i });
        }
        None
    }
}

// ── Phase 3: name recovery ───────────────────────────────────────────────────

/// Scan backward from just above the ratio anchor toward (but never past)
/// the CP anchor. The name sits between the two on every known layout.
pub struct BackwardNameScan;

impl BackwardNameScan {
    pub fn attempt(
        &self,
        transcript: &Transcript,
        cp_line: usize,
        ratio_line: usize,
        cfg: &ExtractConfig,
    ) -> Option<ExtractedField<String>> {
        for i in (cp_line + 1..ratio_line).rev() {
            let line = transcript.line(i)?;
            if let Some(name) = name_candidate(line, cfg) {
                return Some(ExtractedField::at_line(name, 0.85, i));
            }
        }
        None
    }
}

/// Fallback: scan forward within a small window after the CP anchor,
/// identical cleaning and deny rules.
pub struct ForwardNameScan;

impl ForwardNameScan {
    pub fn attempt(
        &self,
        transcript: &Transcript,
        cp_line: usize,
        cfg: &ExtractConfig,
    ) -> Option<ExtractedField<String>> {
        for i in cp_line + 1..=cp_line + cfg.name_window {
            let Some(line) = transcript.line(i) else { break };
            if let Some(name) = name_candidate(line, cfg) {
                return Some(ExtractedField::at_line(name, 0.7, i));
            }
        }
        None
    }
}

/// Shared name validation/cleaning: deny-listed lines are rejected outright;
/// at least 3 letters must survive stripping; the accepted value keeps only
/// letters, spaces, hyphens, periods and apostrophes.
fn name_candidate(line: &str, cfg: &ExtractConfig) -> Option<String> {
    let lower = line.to_lowercase();
    if cfg.deny_list.iter().any(|t| lower.contains(t.as_str())) {
        return None;
    }
    if line.chars().filter(|c| c.is_alphabetic()).count() < 3 {
        return None;
    }
    let cleaned: String = line
        .chars()
        .filter(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '.' | '\''))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.len() >= 3 {
        Some(cleaned.to_string())
    } else {
        None
    }
}

// ── Supplementary fields ─────────────────────────────────────────────────────

/// Labeled Stardust search below the anchors. The label itself gets misread,
/// so the observed corruptions are enumerated alongside the true spelling.
pub struct LabeledStardustSearch;

impl LabeledStardustSearch {
    pub fn attempt(
        &self,
        transcript: &Transcript,
        from: usize,
        cfg: &ExtractConfig,
    ) -> Option<ExtractedField<u32>> {
        for (i, line) in transcript.lines.iter().enumerate().skip(from) {
            let Some(caps) = re_stardust_label().captures(&line.text) else {
                continue;
            };
            let cleaned = clean_digits(caps.get(1)?.as_str());
            let Ok(value) = cleaned.parse::<u32>() else {
                continue;
            };
            if value >= cfg.stardust_min && value <= cfg.stardust_max {
                return Some(ExtractedField::at_line(value, 0.8, i));
            }
        }
        None
    }
}

/// Move names live below the stats block: name-like lines after the last
/// anchor that aren't the species name itself.
fn collect_moves(
    transcript: &Transcript,
    after: usize,
    skip: &[usize],
    species: Option<&str>,
    cfg: &ExtractConfig,
) -> Vec<String> {
    let mut moves = Vec::new();
    for (i, line) in transcript.lines.iter().enumerate().skip(after + 1) {
        if moves.len() >= cfg.max_moves {
            break;
        }
        if skip.contains(&i) {
            continue;
        }
        let Some(candidate) = name_candidate(&line.text, cfg) else {
            continue;
        };
        if species.is_some_and(|n| n.eq_ignore_ascii_case(&candidate)) {
            continue;
        }
        if moves.iter().any(|m: &String| m.eq_ignore_ascii_case(&candidate)) {
            continue;
        }
        moves.push(candidate);
    }
    moves
}

// ── Public extraction API ────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Recover structured fields from an OCR transcript. Pure: same
    /// transcript and config in, same record out. Never panics; every phase
    /// either produces a validated value or falls through, and fields are
    /// populated independently.
    pub fn extract(transcript: &Transcript, cfg: &ExtractConfig) -> ExtractedCreature {
        // Phase 1 — CP anchor. The fallback only runs when the labeled
        // search exhausts the window.
        let strategies: [&dyn CpStrategy; 2] = [&LabeledCpSearch, &LargestBlobSearch];
        let cp_hit = strategies.iter().find_map(|s| s.attempt(transcript, cfg));
        if cp_hit.is_none() {
            tracing::debug!("no CP anchor located; positional phases degraded");
        }

        // Phase 2 — ratio anchor, relative to the CP line when there is one.
        let ratio_hit = RatioSearch.attempt(transcript, cp_hit.map(|c| c.line), cfg);

        // Phase 3 — name, anchored between the two when possible.
        let name = match (cp_hit, ratio_hit) {
            (Some(cp), Some(ratio)) => BackwardNameScan
                .attempt(transcript, cp.line, ratio.line, cfg)
                .or_else(|| ForwardNameScan.attempt(transcript, cp.line, cfg)),
            (Some(cp), None) => ForwardNameScan.attempt(transcript, cp.line, cfg),
            // Without a primary anchor there is nothing to scan relative to.
            (None, _) => None,
        };

        let anchor_floor = ratio_hit
            .map(|r| r.line)
            .or(cp_hit.map(|c| c.line))
            .unwrap_or(0);
        let stardust = LabeledStardustSearch.attempt(transcript, anchor_floor, cfg);

        let moves = if cp_hit.is_some() {
            let mut skip: Vec<usize> = Vec::new();
            if let Some(f) = &name {
                skip.extend(f.line);
            }
            if let Some(f) = &stardust {
                skip.extend(f.line);
            }
            collect_moves(
                transcript,
                stardust
                    .as_ref()
                    .and_then(|f| f.line)
                    .unwrap_or(anchor_floor),
                &skip,
                name.as_ref().map(|f| f.value.as_str()),
                cfg,
            )
        } else {
            Vec::new()
        };

        let cp = cp_hit.map(|h| ExtractedField::at_line(h.value, h.confidence, h.line));
        let hp = ratio_hit.map(|h| ExtractedField::at_line(h.reading, 0.85, h.line));

        // Aggregate confidence: weighted sum of key fields.
        let confidence = {
            let weighted = [
                (cp.as_ref().map(|f| f.confidence), 0.35f32),
                (name.as_ref().map(|f| f.confidence), 0.30),
                (hp.as_ref().map(|f| f.confidence), 0.20),
                (stardust.as_ref().map(|f| f.confidence), 0.15),
            ];
            let (score, weight) = weighted.iter().fold((0.0f32, 0.0f32), |(s, w), (conf, fw)| {
                (s + conf.unwrap_or(0.0) * fw, w + fw)
            });
            if weight > 0.0 {
                score / weight
            } else {
                0.0
            }
        };

        ExtractedCreature { name, cp, hp, stardust, moves, confidence }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ExtractConfig {
        ExtractConfig::default()
    }

    fn transcript(lines: &[&str]) -> Transcript {
        Transcript::from_text(&lines.join("\n"))
    }

    // ── Phase 1, Strategy A ──────────────────────────────────────────────────

    #[test]
    fn labeled_search_finds_plain_cp_line() {
        let t = transcript(&["11:42", "CP2207", "Garchomp"]);
        let hit = LabeledCpSearch.attempt(&t, &cfg()).unwrap();
        assert_eq!(hit.value, 2207);
        assert_eq!(hit.line, 1);
    }

    #[test]
    fn labeled_search_accepts_misread_labels_and_digits() {
        for line in ["CR 1234", "0P 1234", "OP 1234", "CP l234", "CP 12 34"] {
            let t = transcript(&[line]);
            let hit = LabeledCpSearch.attempt(&t, &cfg()).unwrap();
            assert_eq!(hit.value, 1234, "line {line:?}");
        }
    }

    #[test]
    fn labeled_search_tolerates_junk_between_label_and_digits() {
        let t = transcript(&["CP * 2500"]);
        assert_eq!(LabeledCpSearch.attempt(&t, &cfg()).unwrap().value, 2500);
    }

    #[test]
    fn labeled_search_rejects_out_of_range_value() {
        // "CP 99999" must trigger the fallback, not be accepted.
        let t = transcript(&["CP 99999"]);
        assert_eq!(LabeledCpSearch.attempt(&t, &cfg()), None);
    }

    #[test]
    fn labeled_search_respects_leading_window() {
        let mut lines = vec![""; 10];
        lines.push("CP 2500");
        let t = transcript(&lines);
        assert_eq!(LabeledCpSearch.attempt(&t, &cfg()), None);
    }

    // ── Phase 1, Strategy B ──────────────────────────────────────────────────

    #[test]
    fn blob_search_selects_largest_in_range_candidate() {
        let t = transcript(&["11:42", "CP 2500 ish", "1200"]);
        let hit = LargestBlobSearch.attempt(&t, &cfg()).unwrap();
        assert_eq!(hit.value, 2500);
        assert_eq!(hit.line, 1);
    }

    #[test]
    fn blob_search_ignores_time_like_tokens() {
        let t = transcript(&["11:42"]);
        assert_eq!(LargestBlobSearch.attempt(&t, &cfg()), None);
    }

    #[test]
    fn blob_search_accepts_whitespace_split_numbers() {
        let t = transcript(&["3 200"]);
        assert_eq!(LargestBlobSearch.attempt(&t, &cfg()).unwrap().value, 3200);
    }

    #[test]
    fn blob_search_rejects_out_of_range_runs() {
        let t = transcript(&["99999", "7"]);
        assert_eq!(LargestBlobSearch.attempt(&t, &cfg()), None);
    }

    // ── Phase 2 ──────────────────────────────────────────────────────────────

    #[test]
    fn ratio_search_finds_hp_line() {
        let t = transcript(&["CP2207", "Garchomp", "HP 187/187"]);
        let hit = RatioSearch.attempt(&t, Some(0), &cfg()).unwrap();
        assert_eq!(hit.reading, HpReading { current: 187, max: 187 });
        assert_eq!(hit.line, 2);
    }

    #[test]
    fn ratio_search_reads_confusables_on_either_side() {
        let t = transcript(&["CP2207", "HP l87|187"]);
        let hit = RatioSearch.attempt(&t, Some(0), &cfg()).unwrap();
        assert_eq!(hit.reading, HpReading { current: 187, max: 187 });
    }

    #[test]
    fn ratio_search_window_is_bounded() {
        let t = transcript(&["CP2207", "", "", "", "", "", "", "HP 90/90"]);
        assert_eq!(RatioSearch.attempt(&t, Some(0), &cfg()), None);
    }

    // ── Phase 3 ──────────────────────────────────────────────────────────────

    #[test]
    fn deny_listed_line_is_never_a_name() {
        assert_eq!(name_candidate("HEAVIEST DRAGON EVER", &cfg()), None);
        assert_eq!(name_candidate("HP 187/187", &cfg()), None);
        assert_eq!(name_candidate("STARDUST", &cfg()), None);
    }

    #[test]
    fn name_candidate_strips_symbols_and_requires_three_letters() {
        assert_eq!(name_candidate("Garchomp*", &cfg()), Some("Garchomp".into()));
        assert_eq!(name_candidate("x1", &cfg()), None);
        assert_eq!(name_candidate("ab", &cfg()), None);
        assert_eq!(name_candidate("", &cfg()), None);
    }

    #[test]
    fn hyphenated_and_apostrophe_names_survive_cleaning() {
        assert_eq!(name_candidate("Ho-Oh", &cfg()), Some("Ho-Oh".into()));
        assert_eq!(name_candidate("Farfetch'd", &cfg()), Some("Farfetch'd".into()));
    }

    #[test]
    fn backward_scan_takes_candidate_nearest_the_ratio() {
        let t = transcript(&["CP2207", "4", "Garchomp", "HP 187/187"]);
        let name = BackwardNameScan.attempt(&t, 0, 3, &cfg()).unwrap();
        assert_eq!(name.value, "Garchomp");
        assert_eq!(name.line, Some(2));
    }

    #[test]
    fn forward_scan_is_window_bounded() {
        let t = transcript(&["CP2207", "", "", "", "", "Garchomp"]);
        assert_eq!(ForwardNameScan.attempt(&t, 0, &cfg()), None);
    }

    // ── Supplementary fields ─────────────────────────────────────────────────

    #[test]
    fn stardust_labeled_search_reads_value() {
        let t = transcript(&["CP2207", "Garchomp", "HP 187/187", "STARDUST 4000"]);
        let f = LabeledStardustSearch.attempt(&t, 2, &cfg()).unwrap();
        assert_eq!(f.value, 4000);
        assert_eq!(f.line, Some(3));
    }

    #[test]
    fn stardust_corrupted_label_still_matches() {
        let t = transcript(&["5TARDUST 10 000"]);
        let f = LabeledStardustSearch.attempt(&t, 0, &cfg()).unwrap();
        assert_eq!(f.value, 10_000);
    }

    // ── End to end ───────────────────────────────────────────────────────────

    #[test]
    fn full_scan_with_both_anchors() {
        let t = transcript(&["11:42", "CP2207", "Garchomp", "HP 187/187"]);
        let r = Extractor::extract(&t, &cfg());

        let cp = r.cp.unwrap();
        assert_eq!(cp.value, 2207);
        assert_eq!(cp.line, Some(1));

        let hp = r.hp.unwrap();
        assert_eq!(hp.value, HpReading { current: 187, max: 187 });
        assert_eq!(hp.line, Some(3));

        let name = r.name.unwrap();
        assert_eq!(name.value, "Garchomp");
        assert_eq!(name.line, Some(2));
    }

    #[test]
    fn full_scan_falls_back_to_blob_and_forward_name() {
        let t = transcript(&["9:15", "", "3200", "Metagross"]);
        let r = Extractor::extract(&t, &cfg());

        let cp = r.cp.unwrap();
        assert_eq!(cp.value, 3200);
        assert_eq!(cp.line, Some(2));
        assert!(r.hp.is_none());

        assert_eq!(r.name.unwrap().value, "Metagross");
    }

    #[test]
    fn partial_success_keeps_found_fields() {
        let t = transcript(&["CP1000", "HEAVIEST DRAGON EVER", "HP 55/55"]);
        let r = Extractor::extract(&t, &cfg());
        assert_eq!(r.cp.unwrap().value, 1000);
        assert_eq!(r.hp.unwrap().value, HpReading { current: 55, max: 55 });
        assert!(r.name.is_none(), "deny-listed line must never become a name");
    }

    #[test]
    fn empty_transcript_yields_all_not_found() {
        let r = Extractor::extract(&Transcript::default(), &cfg());
        assert!(r.is_empty());
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn garbage_transcript_does_not_panic() {
        let t = transcript(&["!@#$%^&*()", "\u{1}\u{2}", "////", "::::"]);
        let _ = Extractor::extract(&t, &cfg());
    }

    #[test]
    fn moves_are_collected_below_the_stats_block() {
        let t = transcript(&[
            "CP2207",
            "Garchomp",
            "HP 187/187",
            "STARDUST 4000",
            "Dragon Tail",
            "Outrage",
        ]);
        let r = Extractor::extract(&t, &cfg());
        assert_eq!(r.name.as_ref().unwrap().value, "Garchomp");
        assert_eq!(r.moves, vec!["Dragon Tail".to_string(), "Outrage".to_string()]);
    }

    #[test]
    fn confidence_is_higher_for_labeled_cp_than_blob_fallback() {
        let labeled = Extractor::extract(&transcript(&["CP2207"]), &cfg());
        let blob = Extractor::extract(&transcript(&["2207"]), &cfg());
        let labeled_cp = labeled.cp.unwrap();
        let blob_cp = blob.cp.unwrap();
        assert!(labeled_cp.confidence > blob_cp.confidence);
    }
}
