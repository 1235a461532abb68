use std::time::{Duration, Instant};

use crate::models::{Course, Grade, GradeEntry, PageSnapshot, SemesterResult, SemesterSummaryItem, Selection};

/// How long a banner stays visible after it was posted.
pub const NOTIFICATION_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub posted_at: Instant,
}

impl Notification {
    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.posted_at) < NOTIFICATION_WINDOW
    }
}

/// One editable line of the course table.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRow {
    pub course: Course,
    pub selected: Option<Grade>,
}

impl CourseRow {
    fn new(course: Course) -> Self {
        // Anything outside A-F leaves the selector on the empty option.
        let selected = course.grade.as_deref().and_then(|g| g.parse().ok());
        CourseRow { course, selected }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CourseArea {
    #[default]
    Empty,
    NoCourses,
    Table(Vec<CourseRow>),
}

/// Everything the form shows. Reducers consume the state and hand back the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub part_options: Vec<String>,
    pub semester_options: Vec<String>,
    pub selection: Selection,
    pub courses: CourseArea,
    pub semester_gpa: f64,
    pub cumulative_gpa: f64,
    pub summary: Vec<SemesterSummaryItem>,
    pub notification: Option<Notification>,
    pub busy: bool,
}

impl ViewState {
    pub fn from_page(page: PageSnapshot) -> Self {
        ViewState {
            part_options: page.part_options,
            semester_options: page.semester_options,
            cumulative_gpa: page.initial_cgpa,
            summary: page.initial_summary,
            ..ViewState::default()
        }
    }

    pub fn with_part(mut self, part: &str) -> Self {
        self.selection.part = part.to_string();
        self
    }

    pub fn with_semester(mut self, semester: &str) -> Self {
        self.selection.semester = semester.to_string();
        self
    }

    pub fn without_courses(mut self) -> Self {
        self.courses = CourseArea::Empty;
        self
    }

    pub fn with_courses(mut self, courses: Vec<Course>) -> Self {
        self.courses = if courses.is_empty() {
            CourseArea::NoCourses
        } else {
            CourseArea::Table(courses.into_iter().map(CourseRow::new).collect())
        };
        self
    }

    // Unknown codes leave the table untouched.
    pub fn with_grade(mut self, course_code: &str, grade: Option<Grade>) -> Self {
        if let CourseArea::Table(rows) = &mut self.courses {
            for row in rows.iter_mut().filter(|r| r.course.course_code == course_code) {
                row.selected = grade;
            }
        }
        self
    }

    pub fn with_result(mut self, result: SemesterResult) -> Self {
        self.semester_gpa = result.semester_gpa;
        self.cumulative_gpa = result.cumulative_gpa;
        self.summary = result.session_summary;
        self
    }

    /// Fresh calculation: zeroed displays, no summary, no courses, nothing selected.
    pub fn cleared(mut self) -> Self {
        self.semester_gpa = 0.0;
        self.cumulative_gpa = 0.0;
        self.summary.clear();
        self.courses = CourseArea::Empty;
        self.selection = Selection::default();
        self
    }

    pub fn with_busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    pub fn notified(mut self, message: impl Into<String>, kind: NotificationKind, now: Instant) -> Self {
        self.notification = Some(Notification { message: message.into(), kind, posted_at: now });
        self
    }

    pub fn has_course(&self, course_code: &str) -> bool {
        self.rows().iter().any(|r| r.course.course_code == course_code)
    }

    pub fn rows(&self) -> &[CourseRow] {
        match &self.courses {
            CourseArea::Table(rows) => rows.as_slice(),
            _ => &[],
        }
    }

    pub fn grade_selector_count(&self) -> usize {
        self.rows().len()
    }

    /// Rows with a non-empty selector, in table order.
    pub fn grade_entries(&self) -> Vec<GradeEntry> {
        self.rows()
            .iter()
            .filter_map(|row| {
                row.selected.map(|grade| GradeEntry { course_code: row.course.course_code.clone(), grade })
            })
            .collect()
    }

    pub fn add_enabled(&self) -> bool {
        !self.busy && self.grade_selector_count() > 0
    }

    pub fn save_enabled(&self) -> bool {
        !self.busy && !self.summary.is_empty()
    }

    pub fn reset_enabled(&self) -> bool {
        !self.busy
    }

    pub fn add_button_label(&self) -> &'static str {
        if self.busy {
            "Adding..."
        } else {
            "Add Semester"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, grade: Option<&str>) -> Course {
        Course {
            course_code: code.to_string(),
            course_title: format!("{} title", code),
            course_unit: 2,
            is_carry_over: false,
            grade: grade.map(str::to_string),
        }
    }

    #[test]
    fn empty_course_list_renders_no_courses_and_disables_add() {
        let state = ViewState::default().with_courses(Vec::new());
        assert_eq!(state.courses, CourseArea::NoCourses);
        assert!(!state.add_enabled());
    }

    #[test]
    fn existing_grades_preselect_rows() {
        let state = ViewState::default().with_courses(vec![
            course("EDU101", Some("B")),
            course("ETL101", None),
            course("ETL103", Some("Z")),
        ]);
        let selected: Vec<_> = state.rows().iter().map(|r| r.selected).collect();
        assert_eq!(selected, vec![Some(Grade::B), None, None]);
        assert!(state.add_enabled());
    }

    #[test]
    fn grade_entries_skip_empty_selectors() {
        let state = ViewState::default()
            .with_courses(vec![course("EDU101", None), course("ETL101", None), course("ETL103", None)])
            .with_grade("ETL103", Some(Grade::A))
            .with_grade("EDU101", Some(Grade::F))
            .with_grade("MISSING", Some(Grade::C));
        assert_eq!(
            state.grade_entries(),
            vec![
                GradeEntry { course_code: "EDU101".into(), grade: Grade::F },
                GradeEntry { course_code: "ETL103".into(), grade: Grade::A },
            ]
        );
    }

    #[test]
    fn busy_disables_everything() {
        let state = ViewState {
            summary: vec![SemesterSummaryItem { part: "1".into(), semester: "Rain".into(), gpa: 3.0 }],
            ..ViewState::default()
        }
        .with_courses(vec![course("EDU101", None)]);
        assert!(state.add_enabled() && state.save_enabled() && state.reset_enabled());

        let busy = state.with_busy(true);
        assert!(!busy.add_enabled() && !busy.save_enabled() && !busy.reset_enabled());
        assert_eq!(busy.add_button_label(), "Adding...");
    }

    #[test]
    fn cleared_keeps_select_options() {
        let state = ViewState::from_page(PageSnapshot {
            initial_cgpa: 3.9,
            initial_summary: vec![SemesterSummaryItem { part: "1".into(), semester: "Rain".into(), gpa: 3.9 }],
            part_options: vec!["1".into(), "2".into()],
            semester_options: vec!["Harmattan".into(), "Rain".into()],
            flash: None,
        })
        .with_part("1")
        .with_semester("Rain")
        .with_courses(vec![course("EDU102", None)])
        .cleared();

        assert_eq!(state.cumulative_gpa, 0.0);
        assert!(state.summary.is_empty());
        assert_eq!(state.courses, CourseArea::Empty);
        assert_eq!(state.selection, Selection::default());
        assert_eq!(state.part_options, vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn notification_hides_after_window() {
        let posted = Instant::now();
        let state = ViewState::default().notified("Semester added successfully!", NotificationKind::Success, posted);
        let banner = state.notification.as_ref().unwrap();
        assert!(banner.is_visible(posted + Duration::from_millis(2999)));
        assert!(!banner.is_visible(posted + NOTIFICATION_WINDOW));
    }

    #[test]
    fn later_notification_replaces_earlier() {
        let now = Instant::now();
        let state = ViewState::default()
            .notified("first", NotificationKind::Error, now)
            .notified("second", NotificationKind::Success, now);
        assert_eq!(state.notification.unwrap().message, "second");
    }
}
