use crate::model::Grade;
use crate::resolve::ResolvedGrade;
use serde::Serialize;

/// Round half up at two decimals on the exact binary value of `x`, returned
/// as whole hundredths. `100.0 * x` is itself rounded, so every comparison
/// goes through `mul_add`, whose sign is that of the exact `100x - c`.
fn hundredths_half_up(x: f64) -> i64 {
    let mut h = (x * 100.0).floor();
    if x.mul_add(100.0, -h) < 0.0 {
        h -= 1.0;
    } else if x.mul_add(100.0, -(h + 1.0)) >= 0.0 {
        h += 1.0;
    }
    if x.mul_add(100.0, -(h + 0.5)) >= 0.0 {
        h += 1.0;
    }
    h as i64
}

pub fn round_off_2_decimals(x: f64) -> f64 {
    hundredths_half_up(x) as f64 / 100.0
}

/// Two-decimal rendering built from the rounded hundredths, so the text never
/// goes through a second rounding step. Inputs are non-negative GPAs.
pub fn format_2_decimals(x: f64) -> String {
    let h = hundredths_half_up(x);
    format!("{}.{:02}", h / 100, h % 100)
}

/// One grade row as the engine sees it: the grade (if evaluated) and the
/// credits of the resolved subject.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeRow {
    pub grade: Option<Grade>,
    pub credits: f64,
}

impl From<&ResolvedGrade<'_>> for GradeRow {
    fn from(r: &ResolvedGrade<'_>) -> Self {
        Self {
            grade: r.grade(),
            credits: r.credits(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gpa {
    pub value: f64,
    pub graded_credits: f64,
}

impl Gpa {
    pub fn display(&self) -> String {
        format_2_decimals(self.value)
    }
}

/// Credit-weighted mean of the graded rows. No graded rows (or zero total
/// credits) gives exactly 0.
pub fn gpa<I>(rows: I) -> Gpa
where
    I: IntoIterator<Item = GradeRow>,
{
    let mut points: f64 = 0.0;
    let mut credits: f64 = 0.0;
    for r in rows {
        if let Some(g) = r.grade {
            points += g.value() * r.credits;
            credits += r.credits;
        }
    }
    let value = if credits > 0.0 { points / credits } else { 0.0 };
    Gpa {
        value,
        graded_credits: credits,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    HighHonors,
    Good,
    Progressing,
}

impl Standing {
    /// Thresholds apply to the two-decimal GPA shown to the user.
    pub fn from_gpa(gpa: &Gpa) -> Self {
        let shown = round_off_2_decimals(gpa.value);
        if shown >= 3.5 {
            Self::HighHonors
        } else if shown >= 3.0 {
            Self::Good
        } else {
            Self::Progressing
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    pub grade: f64,
    pub label: String,
    pub count: usize,
}

/// One bucket per scale value, in scale order, zero counts included.
pub fn histogram<I>(rows: I) -> Vec<HistogramBucket>
where
    I: IntoIterator<Item = GradeRow>,
{
    let mut counts = [0usize; Grade::SCALE.len()];
    for r in rows {
        let Some(g) = r.grade else {
            continue;
        };
        if let Some(i) = Grade::SCALE.iter().position(|v| *v == g.value()) {
            counts[i] += 1;
        }
    }
    Grade::SCALE
        .iter()
        .zip(counts)
        .map(|(v, count)| HistogramBucket {
            grade: *v,
            label: v.to_string(),
            count,
        })
        .collect()
}

/// The pie series: the bar series without empty buckets.
pub fn pie_series(bar: &[HistogramBucket]) -> Vec<HistogramBucket> {
    bar.iter().filter(|b| b.count > 0).cloned().collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub gpa: String,
    pub gpa_value: f64,
    pub graded_credits: f64,
    pub standing: Standing,
    pub resolved_count: usize,
    pub evaluated_count: usize,
    pub bar: Vec<HistogramBucket>,
    pub pie: Vec<HistogramBucket>,
}

pub fn student_stats(rows: &[GradeRow]) -> StudentStats {
    let g = gpa(rows.iter().copied());
    let bar = histogram(rows.iter().copied());
    let pie = pie_series(&bar);
    StudentStats {
        gpa: g.display(),
        gpa_value: round_off_2_decimals(g.value),
        graded_credits: g.graded_credits,
        standing: Standing::from_gpa(&g),
        resolved_count: rows.len(),
        evaluated_count: rows.iter().filter(|r| r.grade.is_some()).count(),
        bar,
        pie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(grade: Option<f64>, credits: f64) -> GradeRow {
        GradeRow {
            grade: grade.map(|g| Grade::new(g).expect("scale value")),
            credits,
        }
    }

    #[test]
    fn gpa_weights_by_credits() {
        let g = gpa([row(Some(4.0), 2.0), row(Some(3.0), 2.0)]);
        assert_eq!(g.display(), "3.50");

        let g = gpa([row(Some(4.0), 1.5), row(None, 1.0)]);
        assert_eq!(g.display(), "4.00");
        assert_eq!(g.graded_credits, 1.5);
    }

    #[test]
    fn gpa_without_graded_rows_is_zero() {
        assert_eq!(gpa(std::iter::empty()).display(), "0.00");
        assert_eq!(gpa([row(None, 2.0), row(None, 1.0)]).display(), "0.00");
    }

    #[test]
    fn rounding_is_half_up_on_binary_value() {
        // 3.625 is exact in binary, so the tie rounds up.
        assert_eq!(format_2_decimals(3.625), "3.63");
        // The double nearest 2.675 sits just below it.
        assert_eq!(format_2_decimals(2.675), "2.67");
        assert_eq!(format_2_decimals(0.0), "0.00");
        assert_eq!(format_2_decimals(4.0), "4.00");
        assert_eq!(format_2_decimals(3.0 + 1.0 / 3.0), "3.33");
        // 1.005 and 0.285 are stored just below the tie; 0.57 scales to just under 57.
        assert_eq!(format_2_decimals(1.005), "1.00");
        assert_eq!(format_2_decimals(0.285), "0.28");
        assert_eq!(format_2_decimals(0.57), "0.57");
        assert_eq!(format_2_decimals(1.125), "1.13");

        // (4 * 2.5 + 3 * 1.5) / 4 = 3.625 exactly.
        let g = gpa([row(Some(4.0), 2.5), row(Some(3.0), 1.5)]);
        assert_eq!(g.value, 3.625);
        assert_eq!(g.display(), "3.63");
        assert_eq!(round_off_2_decimals(2.675), 2.67);
    }

    #[test]
    fn transcript_just_below_a_tie_rounds_down() {
        // 30.5 / 20 = 1.525, stored as 1.52499999999999991...; scaling by 100
        // first would land on 152.5 and round up.
        let g = gpa([
            row(Some(1.0), 2.5),
            row(Some(0.0), 2.0),
            row(Some(1.0), 2.5),
            row(Some(1.0), 3.0),
            row(Some(4.0), 0.5),
            row(Some(2.0), 4.0),
            row(Some(0.0), 0.5),
            row(Some(2.5), 2.0),
            row(Some(2.5), 3.0),
        ]);
        assert_eq!(g.graded_credits, 20.0);
        assert_eq!(g.value, 1.525);
        assert_eq!(g.display(), "1.52");
        assert_eq!(student_stats(&[row(Some(1.0), 2.5), row(Some(2.0), 2.5)]).gpa, "1.50");
    }

    #[test]
    fn histogram_always_has_eight_ordered_buckets() {
        let empty = histogram(std::iter::empty());
        assert_eq!(empty.len(), 8);
        assert!(empty.iter().all(|b| b.count == 0));

        let bar = histogram([
            row(Some(4.0), 1.0),
            row(Some(4.0), 1.0),
            row(Some(1.5), 1.0),
            row(Some(0.0), 1.0),
            row(None, 1.0),
        ]);
        let grades: Vec<f64> = bar.iter().map(|b| b.grade).collect();
        assert_eq!(grades, Grade::SCALE.to_vec());
        let counts: Vec<usize> = bar.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 0, 0, 2]);
        assert_eq!(bar[2].label, "1.5");

        let pie = pie_series(&bar);
        let labels: Vec<&str> = pie.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "1.5", "4"]);
    }

    #[test]
    fn stats_count_nulls_as_resolved_but_not_evaluated() {
        let stats = student_stats(&[row(Some(3.0), 1.0), row(None, 1.0), row(Some(4.0), 1.0)]);
        assert_eq!(stats.resolved_count, 3);
        assert_eq!(stats.evaluated_count, 2);
        assert_eq!(stats.gpa, "3.50");
        assert_eq!(stats.standing, Standing::HighHonors);
        assert_eq!(stats.bar.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn standing_thresholds() {
        let s = |v: f64| {
            Standing::from_gpa(&Gpa {
                value: v,
                graded_credits: 1.0,
            })
        };
        assert_eq!(s(3.5), Standing::HighHonors);
        assert_eq!(s(3.499), Standing::HighHonors);
        assert_eq!(s(3.0), Standing::Good);
        assert_eq!(s(2.99), Standing::Progressing);
    }
}
