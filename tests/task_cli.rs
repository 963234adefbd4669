mod support;

use predicates::str::contains;
use serde_json::json;

use support::{TestBoard, ALICE, BOB};

#[test]
fn new_task_lands_in_todo_column() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    let project_id = board.new_project(ALICE, "Launch")?;
    let task_id = board.new_task(ALICE, &project_id, "Write docs")?;

    let stored = board.read_data()?;
    let record = &stored["tasks"][&task_id];
    assert_eq!(record["taskId"], task_id.as_str());
    assert_eq!(record["projectId"], project_id.as_str());
    assert_eq!(record["status"], "To Do");
    assert_eq!(record["assigneeId"], ALICE.1);
    assert_eq!(record["dueDate"], "");

    let data = board.json_as(ALICE, &["task", "board", &project_id])?;
    assert_eq!(data["total"].as_u64(), Some(1));
    assert_eq!(data["columns"]["To Do"][0]["id"], task_id.as_str());
    assert_eq!(data["columns"]["In Progress"], json!([]));
    assert_eq!(data["columns"]["Done"], json!([]));
    Ok(())
}

#[test]
fn assignee_and_due_date_are_recorded() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    let project_id = board.new_project(ALICE, "Launch")?;
    board.json_as(ALICE, &["project", "invite", &project_id, BOB.1])?;

    let task = board.json_as(
        ALICE,
        &[
            "task",
            "new",
            &project_id,
            "Review",
            "-d",
            "Check it",
            "--assignee",
            BOB.1,
            "--due",
            "2025-03-01",
        ],
    )?;
    assert_eq!(task["assignee_email"], BOB.1);
    assert_eq!(task["due_date"], "2025-03-01");

    let stored = board.read_data()?;
    let id = task["id"].as_str().ok_or("task id")?;
    assert_eq!(stored["tasks"][id]["dueDate"], "2025-03-01");

    board
        .cmd_as(ALICE)
        .args(["task", "new", &project_id, "Bad", "-d", "x", "--due", "03/01/2025"])
        .assert()
        .code(2)
        .stderr(contains("due date"));
    Ok(())
}

#[test]
fn status_moves_task_between_columns() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    let project_id = board.new_project(ALICE, "Launch")?;
    let task_id = board.new_task(ALICE, &project_id, "Ship")?;

    let changed = board.json_as(ALICE, &["task", "status", &task_id, "in-progress"])?;
    assert_eq!(changed["status"], "In Progress");
    let data = board.json_as(ALICE, &["task", "board", &project_id])?;
    assert_eq!(data["columns"]["In Progress"][0]["id"], task_id.as_str());

    board.json_as(ALICE, &["task", "status", &task_id, "Done"])?;
    board.json_as(ALICE, &["task", "status", &task_id, "todo"])?;
    let stored = board.read_data()?;
    assert_eq!(stored["tasks"][&task_id]["status"], "To Do");

    board
        .cmd_as(ALICE)
        .args(["task", "status", &task_id, "blocked"])
        .assert()
        .code(2)
        .stderr(contains("unknown status"));
    Ok(())
}

#[test]
fn unrecognized_stored_status_is_hidden_from_board() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    board.seed(&json!({
        "projects": {
            "p1": { "projectId": "p1", "title": "Seeded", "ownerId": ALICE.0, "memberEmails": [ALICE.1] }
        },
        "tasks": {
            "t1": { "taskId": "t1", "projectId": "p1", "title": "Odd", "status": "Archived", "assigneeId": ALICE.1 },
            "t2": { "taskId": "t2", "projectId": "p1", "title": "Plain", "assigneeId": ALICE.1 }
        }
    }))?;

    let data = board.json_as(ALICE, &["task", "board", "p1"])?;
    assert_eq!(data["total"].as_u64(), Some(1));
    assert_eq!(data["columns"]["To Do"][0]["id"], "t2");
    Ok(())
}

#[test]
fn delete_removes_task_but_keeps_comments() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    let project_id = board.new_project(ALICE, "Launch")?;
    let task_id = board.new_task(ALICE, &project_id, "Temporary")?;
    board.json_as(ALICE, &["comment", "post", &task_id, "soon gone"])?;

    board.json_as(ALICE, &["task", "delete", &task_id])?;
    let stored = board.read_data()?;
    assert!(stored.get("tasks").is_none() || stored["tasks"].get(&task_id).is_none());
    assert!(stored["comments"][&task_id].is_object());

    board
        .cmd_as(ALICE)
        .args(["task", "delete", &task_id])
        .assert()
        .code(2)
        .stderr(contains("Task not found"));
    Ok(())
}

#[test]
fn tasks_of_hidden_projects_are_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    let project_id = board.new_project(ALICE, "Private")?;
    let task_id = board.new_task(ALICE, &project_id, "Secret")?;

    board
        .cmd_as(BOB)
        .args(["task", "board", &project_id])
        .assert()
        .code(2)
        .stderr(contains("Project not found"));
    board
        .cmd_as(BOB)
        .args(["task", "status", &task_id, "done"])
        .assert()
        .code(2)
        .stderr(contains("Task not found"));
    board
        .cmd_as(BOB)
        .args(["comment", "list", &task_id])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn comments_keep_posting_order() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    let project_id = board.new_project(ALICE, "Launch")?;
    let task_id = board.new_task(ALICE, &project_id, "Discuss")?;

    let empty = board.json_as(ALICE, &["comment", "list", &task_id])?;
    assert_eq!(empty["total"].as_u64(), Some(0));

    let posted = board.json_as(ALICE, &["comment", "post", &task_id, "first"])?;
    assert_eq!(posted["text"], "first");
    assert_eq!(posted["task_id"], task_id.as_str());
    board.json_as(ALICE, &["comment", "post", &task_id, "second"])?;

    board
        .cmd_as(ALICE)
        .args(["comment", "post", &task_id, "   "])
        .assert()
        .code(2);

    let listed = board.json_as(ALICE, &["comment", "list", &task_id])?;
    assert_eq!(listed["total"].as_u64(), Some(2));
    assert_eq!(listed["comments"], json!(["first", "second"]));
    Ok(())
}

#[test]
fn seeded_comments_are_listed_in_store_order() -> Result<(), Box<dyn std::error::Error>> {
    let board = TestBoard::new()?;
    board.seed(&json!({
        "projects": { "p1": { "projectId": "p1", "ownerId": ALICE.0 } },
        "tasks": { "t1": { "taskId": "t1", "projectId": "p1", "status": "To Do" } },
        "comments": {
            "t1": {
                "-a": { "text": "one" },
                "-b": { "body": "no text field" },
                "-c": { "text": "two" }
            }
        }
    }))?;
    let listed = board.json_as(ALICE, &["comment", "list", "t1"])?;
    assert_eq!(listed["comments"], json!(["one", "two"]));
    Ok(())
}
