use std::time::Instant;

use crate::models::{Grade, SemesterSummaryItem};
use crate::state::{CourseArea, CourseRow, NotificationKind, ViewState};

pub const NO_COURSES: &str = "No courses found for this selection.";

pub fn format_gpa(gpa: f64) -> String {
    format!("{:.2}", gpa)
}

pub fn summary_line(item: &SemesterSummaryItem) -> String {
    format!("Part {} {} - GPA: {}", item.part, item.semester, format_gpa(item.gpa))
}

fn grade_cell(grade: Option<Grade>) -> String {
    grade.map(|g| g.to_string()).unwrap_or_else(|| "--".to_string())
}

fn course_line(row: &CourseRow) -> String {
    let mut title = row.course.course_title.clone();
    if row.course.is_carry_over {
        title.push_str(" (Carry-over)");
    }
    format!(
        "  {:<10} {:<50} {:>4}  [{}]",
        row.course.course_code,
        title,
        row.course.course_unit,
        grade_cell(row.selected)
    )
}

fn button(label: &str, enabled: bool) -> String {
    if enabled {
        format!("[ {} ]", label)
    } else {
        format!("( {} )", label)
    }
}

fn select_value(value: &str) -> &str {
    if value.is_empty() {
        "--"
    } else {
        value
    }
}

/// Projects the view state onto the terminal. Same state and instant, same text.
pub fn render_page(state: &ViewState, now: Instant) -> String {
    let mut page = String::new();

    if let Some(banner) = state.notification.as_ref().filter(|n| n.is_visible(now)) {
        let marker = match banner.kind {
            NotificationKind::Success => "OK",
            NotificationKind::Error => "!!",
        };
        page.push_str(&format!("{} {}\n\n", marker, banner.message));
    }

    page.push_str(&format!(
        "Part: {}   Semester: {}\n",
        select_value(&state.selection.part),
        select_value(&state.selection.semester)
    ));

    match &state.courses {
        CourseArea::Empty => {}
        CourseArea::NoCourses => page.push_str(&format!("{}\n", NO_COURSES)),
        CourseArea::Table(rows) => {
            page.push_str(&format!(
                "  {:<10} {:<50} {:>4}  {}\n",
                "Code", "Course Title", "Unit", "Grade"
            ));
            for row in rows {
                page.push_str(&course_line(row));
                page.push('\n');
            }
        }
    }

    page.push_str(&format!(
        "\nSemester GPA: {}   Cumulative GPA: {}\n",
        format_gpa(state.semester_gpa),
        format_gpa(state.cumulative_gpa)
    ));

    page.push_str("Session summary:\n");
    for item in &state.summary {
        page.push_str(&format!("  {}\n", summary_line(item)));
    }

    page.push_str(&format!(
        "\n{} {} {}\n",
        button(state.add_button_label(), state.add_enabled()),
        button("New Calculation", state.reset_enabled()),
        button("Save Calculation", state.save_enabled())
    ));
    page
}
