use std::fmt::Write;

use crate::models::{ActionCount, ActorResume, GroupResume, Resume, ScoreTable, SuccessfulCounts};

fn stat(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:.3}"))
}

fn write_actions(output: &mut String, actions: &[ActionCount]) {
    let _ = writeln!(output, "## Actions");
    let active: Vec<&ActionCount> = actions.iter().filter(|action| action.count > 0).collect();

    if active.is_empty() {
        let _ = writeln!(output, "No recorded actions.");
        return;
    }

    for action in active {
        let _ = writeln!(
            output,
            "- {} {}: {}",
            action.verb, action.category, action.count
        );
    }
}

fn write_scores(output: &mut String, scores: &ScoreTable) {
    let _ = writeln!(output, "## Scores");
    let mut reported = scores.reported().peekable();

    if reported.peek().is_none() {
        let _ = writeln!(output, "No graded work recorded.");
        return;
    }

    for row in reported {
        let _ = writeln!(
            output,
            "- {}: min {} / avg {} / max {}",
            row.kind,
            stat(row.min),
            stat(row.avg),
            stat(row.max)
        );
    }
}

fn write_successful(output: &mut String, successful: &SuccessfulCounts) {
    let _ = writeln!(output, "## Successful Assessments");
    let _ = writeln!(output, "- quiz: {}", successful.quiz);
    let _ = writeln!(output, "- homework: {}", successful.homework);
    let _ = writeln!(output, "- test: {}", successful.test);
}

pub fn render_actor(resume: &ActorResume) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Engagement Resume: actor {}", resume.actor_id);
    let _ = writeln!(
        output,
        "Enrolled in {} at {}",
        resume.course, resume.institution
    );
    let _ = writeln!(output);
    write_actions(&mut output, &resume.actions);
    let _ = writeln!(output);
    write_scores(&mut output, &resume.scores);
    let _ = writeln!(output);
    write_successful(&mut output, &resume.successful);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Standing");
    let _ = writeln!(
        output,
        "- course: place {} of {} students",
        resume.place_in_course.place, resume.place_in_course.population_size
    );
    let _ = writeln!(
        output,
        "- institution: place {} of {} students",
        resume.place_in_institution.place, resume.place_in_institution.population_size
    );

    output
}

pub fn render_group(resume: &GroupResume) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Engagement Resume: {} {}", resume.kind, resume.name);
    let _ = writeln!(output, "{} students", resume.total_students);
    let _ = writeln!(output);
    write_actions(&mut output, &resume.actions);
    let _ = writeln!(output);
    write_scores(&mut output, &resume.scores);
    let _ = writeln!(output);
    write_successful(&mut output, &resume.successful);

    if let Some(courses) = &resume.students_per_course {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Students per Course");
        for course in courses {
            let _ = writeln!(output, "- {}: {}", course.course, course.students);
        }
    }

    output
}

pub fn render_markdown(resume: &Resume) -> String {
    match resume {
        Resume::Actor(resume) => render_actor(resume),
        Resume::Group(resume) => render_group(resume),
    }
}

pub fn render_json(resume: &Resume) -> serde_json::Result<String> {
    serde_json::to_string_pretty(resume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssessmentKind, CourseHeadcount, GroupKind, Place, ScoreRow};

    fn scores() -> ScoreTable {
        ScoreTable {
            rows: vec![
                ScoreRow {
                    kind: AssessmentKind::Homework,
                    min: Some(0.25),
                    avg: Some(0.5),
                    max: Some(0.75),
                },
                ScoreRow::undefined(AssessmentKind::Test),
                ScoreRow::undefined(AssessmentKind::Quiz),
            ],
        }
    }

    #[test]
    fn actor_report_lists_standing_and_reported_scores() {
        let resume = ActorResume {
            actor_id: 7,
            course: "Algebra".to_string(),
            institution: "North".to_string(),
            actions: vec![
                ActionCount {
                    category: "homework".to_string(),
                    verb: "scored".to_string(),
                    count: 3,
                },
                ActionCount {
                    category: "quiz".to_string(),
                    verb: "completed".to_string(),
                    count: 0,
                },
            ],
            scores: scores(),
            successful: SuccessfulCounts {
                quiz: 0,
                homework: 3,
                test: 0,
            },
            place_in_course: Place {
                place: 2,
                population_size: 12,
            },
            place_in_institution: Place {
                place: 5,
                population_size: 40,
            },
        };

        let report = render_actor(&resume);

        assert!(report.contains("# Engagement Resume: actor 7"));
        assert!(report.contains("- scored homework: 3"));
        assert!(!report.contains("completed quiz"));
        assert!(report.contains("- homework: min 0.250 / avg 0.500 / max 0.750"));
        assert!(!report.contains("- test: min"));
        assert!(report.contains("- course: place 2 of 12 students"));
        assert!(report.contains("- institution: place 5 of 40 students"));
    }

    #[test]
    fn institution_report_lists_courses() {
        let resume = Resume::Group(GroupResume {
            name: "North".to_string(),
            kind: GroupKind::Institution,
            actions: Vec::new(),
            scores: ScoreTable {
                rows: vec![ScoreRow::undefined(AssessmentKind::Quiz)],
            },
            successful: SuccessfulCounts {
                quiz: 0,
                homework: 0,
                test: 0,
            },
            total_students: 3,
            students_per_course: Some(vec![CourseHeadcount {
                course: "Algebra".to_string(),
                students: 3,
            }]),
        });

        let report = render_markdown(&resume);
        assert!(report.contains("# Engagement Resume: institution North"));
        assert!(report.contains("No recorded actions."));
        assert!(report.contains("No graded work recorded."));
        assert!(report.contains("- Algebra: 3"));

        let json = render_json(&resume).expect("resume serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["report"], "group");
        assert_eq!(value["kind"], "institution");
        assert_eq!(value["total_students"], 3);
        assert!(value["scores"]["rows"][0]["min"].is_null());
    }
}
