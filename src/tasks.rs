use chrono::NaiveDate;

use crate::models::{Task, TaskStatus};

/// A task is overdue once its due date has passed and it was never
/// completed. Undated tasks are never overdue.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    match task.due_date {
        Some(due) => due < today && task.status != TaskStatus::Completed,
        None => false,
    }
}

/// Bucket tasks by status in the fixed board order, keeping each
/// bucket's input order.
pub fn group_by_status(tasks: &[Task]) -> Vec<(TaskStatus, Vec<Task>)> {
    TaskStatus::ALL
        .into_iter()
        .map(|status| {
            let bucket: Vec<Task> = tasks
                .iter()
                .filter(|t| t.status == status)
                .cloned()
                .collect();
            (status, bucket)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: u32, status: TaskStatus, due: Option<&str>) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            description: String::new(),
            status,
            due_date: due.map(|d| d.parse().unwrap()),
            assigned_to: None,
            property_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn past_due_incomplete_tasks_are_overdue() {
        let today: NaiveDate = "2024-07-10".parse().unwrap();
        assert!(is_overdue(
            &task(1, TaskStatus::InProgress, Some("2024-07-01")),
            today
        ));
        // due today is not overdue yet
        assert!(!is_overdue(
            &task(2, TaskStatus::NotStarted, Some("2024-07-10")),
            today
        ));
        // completed tasks never go overdue
        assert!(!is_overdue(
            &task(3, TaskStatus::Completed, Some("2024-06-01")),
            today
        ));
        assert!(!is_overdue(&task(4, TaskStatus::NotStarted, None), today));
    }

    #[test]
    fn grouping_covers_every_status_and_keeps_order() {
        let tasks = vec![
            task(1, TaskStatus::Completed, None),
            task(2, TaskStatus::NotStarted, None),
            task(3, TaskStatus::NotStarted, None),
        ];
        let groups = group_by_status(&tasks);
        assert_eq!(groups.len(), TaskStatus::ALL.len());
        assert_eq!(groups[0].0, TaskStatus::NotStarted);
        let ids: Vec<u32> = groups[0].1.iter().map(|t| t.id).collect();
        assert_eq!(ids, [2, 3]);
        assert!(groups[3].1.is_empty());
    }
}
