mod common;

use std::collections::HashSet;

use common::{sample_quiz, Harness};
use quizdesk_server::{
    errors::AppError,
    models::{
        domain::{AccessType, Attempt, UserRole},
        dto::request::{
            AnswerInput, CreateGroupRequest, JoinGroupRequest, QuestionInput, QuizRequest,
            SubmitAttemptRequest,
        },
    },
    services::access_control::hash_access_code,
};

fn submission(quiz: &quizdesk_server::models::domain::Quiz, picks: &[i64]) -> SubmitAttemptRequest {
    SubmitAttemptRequest {
        answers: quiz
            .questions
            .iter()
            .zip(picks)
            .map(|(q, pick)| AnswerInput {
                question_id: q.id.clone(),
                selected_index: *pick,
            })
            .collect(),
        time_taken_seconds: Some(42),
        access_code: None,
    }
}

#[tokio::test]
async fn test_global_quiz_is_listed_and_graded() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let quiz = harness.seed_quiz(sample_quiz(&teacher.id)).await;
    let actor = Harness::claims_for(&student);

    let listed = harness
        .state
        .quiz_service
        .list_available(&actor, None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, quiz.id);

    let result = harness
        .state
        .attempt_service
        .submit_attempt(&actor, &quiz.id, submission(&quiz, &[0, 2, 0]))
        .await
        .unwrap();

    assert_eq!(result.score, 2);
    assert_eq!(result.total_marks, 3);
    let correctness: Vec<bool> = result.review.iter().map(|r| r.is_correct).collect();
    assert_eq!(correctness, vec![true, true, false]);
}

#[tokio::test]
async fn test_second_single_attempt_is_rejected_and_first_score_kept() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let quiz = harness.seed_quiz(sample_quiz(&teacher.id)).await;
    let actor = Harness::claims_for(&student);
    let attempts = &harness.state.attempt_service;

    attempts
        .submit_attempt(&actor, &quiz.id, submission(&quiz, &[0, 0, 0]))
        .await
        .unwrap();
    let second = attempts
        .submit_attempt(&actor, &quiz.id, submission(&quiz, &[0, 2, 1]))
        .await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
    let history = attempts.my_attempts(&actor).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score, 1);
}

#[tokio::test]
async fn test_repeatable_quiz_accepts_more_attempts() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let mut quiz = sample_quiz(&teacher.id);
    quiz.single_attempt = false;
    let quiz = harness.seed_quiz(quiz).await;
    let actor = Harness::claims_for(&student);

    for _ in 0..2 {
        harness
            .state
            .attempt_service
            .submit_attempt(&actor, &quiz.id, submission(&quiz, &[0, 2, 1]))
            .await
            .unwrap();
    }

    let history = harness.state.attempt_service.my_attempts(&actor).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_code_quiz_requires_matching_code() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let mut quiz = sample_quiz(&teacher.id);
    quiz.access_type = AccessType::Code;
    quiz.access_code = Some("ABCD2345".to_string());
    quiz.access_code_hash = Some(hash_access_code("ABCD2345"));
    let quiz = harness.seed_quiz(quiz).await;
    let actor = Harness::claims_for(&student);
    let quizzes = &harness.state.quiz_service;

    let listed = quizzes.list_available(&actor, None).await.unwrap();
    assert!(listed.is_empty());

    let missing = quizzes.get_for_attempt(&actor, &quiz.id, None).await;
    assert!(matches!(missing, Err(AppError::Forbidden(_))));

    let wrong = quizzes.get_for_attempt(&actor, &quiz.id, Some("ZZZZ9999")).await;
    assert!(matches!(wrong, Err(AppError::Forbidden(_))));

    let redeemed = quizzes.redeem_code(&actor, " abcd2345 ").await.unwrap();
    assert_eq!(redeemed.id, quiz.id);

    let opened = quizzes
        .get_for_attempt(&actor, &quiz.id, Some("abcd2345"))
        .await
        .unwrap();
    assert_eq!(opened.questions.len(), 3);
    assert!(!opened.attempted);
}

#[tokio::test]
async fn test_group_quiz_is_visible_to_members_only() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (member, _) = harness.seed_user("Mia", UserRole::Student).await;
    let (outsider, _) = harness.seed_user("Olly", UserRole::Student).await;
    let groups = &harness.state.group_service;

    let group = groups
        .create(
            &Harness::claims_for(&teacher),
            CreateGroupRequest {
                name: "Period 3".to_string(),
            },
        )
        .await
        .unwrap();
    groups
        .join(
            &Harness::claims_for(&member),
            JoinGroupRequest {
                code: group.code.to_lowercase(),
            },
        )
        .await
        .unwrap();

    let mut quiz = sample_quiz(&teacher.id);
    quiz.access_type = AccessType::Group;
    quiz.group_id = Some(group.id.clone());
    let quiz = harness.seed_quiz(quiz).await;
    let quizzes = &harness.state.quiz_service;

    let for_member = quizzes
        .list_available(&Harness::claims_for(&member), None)
        .await
        .unwrap();
    assert_eq!(for_member.len(), 1);

    let for_outsider = quizzes
        .list_available(&Harness::claims_for(&outsider), None)
        .await
        .unwrap();
    assert!(for_outsider.is_empty());

    let denied = quizzes
        .get_for_attempt(&Harness::claims_for(&outsider), &quiz.id, None)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_served_quiz_keeps_questions_and_hides_answers() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let quiz = harness.seed_quiz(sample_quiz(&teacher.id)).await;

    let served = harness
        .state
        .quiz_service
        .get_for_attempt(&Harness::claims_for(&student), &quiz.id, None)
        .await
        .unwrap();

    let served_ids: HashSet<&str> = served.questions.iter().map(|q| q.id.as_str()).collect();
    let stored_ids: HashSet<&str> = quiz.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(served_ids, stored_ids);

    for question in &served.questions {
        let stored = quiz.find_question(&question.id).unwrap();
        assert_eq!(question.text, stored.text);
        assert_eq!(question.options, stored.options);
    }

    let json = serde_json::to_string(&served).unwrap();
    assert!(!json.contains("correctIndex"));
}

#[tokio::test]
async fn test_leaderboard_orders_by_score_then_time() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (slow, _) = harness.seed_user("Slow", UserRole::Student).await;
    let (fast, _) = harness.seed_user("Fast", UserRole::Student).await;
    let (top, _) = harness.seed_user("Top", UserRole::Student).await;
    let quiz = harness.seed_quiz(sample_quiz(&teacher.id)).await;

    for (user, score, seconds) in [(&slow, 8, 120), (&fast, 8, 90), (&top, 9, 200)] {
        harness
            .repos
            .attempts
            .create(Attempt::new(&user.id, &quiz.id, true, vec![], score, seconds))
            .await
            .unwrap();
    }

    let board = harness
        .state
        .leaderboard_service
        .leaderboard(&Harness::claims_for(&slow), &quiz.id, None)
        .await
        .unwrap();

    let names: Vec<&str> = board.iter().map(|e| e.user_name.as_str()).collect();
    assert_eq!(names, vec!["Top", "Fast", "Slow"]);
    let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_leaderboard_keeps_top_ten() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let mut quiz = sample_quiz(&teacher.id);
    quiz.single_attempt = false;
    let quiz = harness.seed_quiz(quiz).await;

    for seconds in 0..12 {
        harness
            .repos
            .attempts
            .create(Attempt::new(&teacher.id, &quiz.id, false, vec![], 2, seconds))
            .await
            .unwrap();
    }

    let board = harness
        .state
        .leaderboard_service
        .leaderboard(&Harness::claims_for(&teacher), &quiz.id, None)
        .await
        .unwrap();

    assert_eq!(board.len(), 10);
    assert_eq!(board[0].time_taken_seconds, 0);
    assert_eq!(board[9].time_taken_seconds, 9);
}

#[tokio::test]
async fn test_group_owner_cannot_leave_but_member_can() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (first, _) = harness.seed_user("Ann", UserRole::Student).await;
    let (second, _) = harness.seed_user("Ben", UserRole::Student).await;
    let groups = &harness.state.group_service;
    let owner = Harness::claims_for(&teacher);

    let group = groups
        .create(
            &owner,
            CreateGroupRequest {
                name: "Chemistry".to_string(),
            },
        )
        .await
        .unwrap();
    for student in [&first, &second] {
        groups
            .join(
                &Harness::claims_for(student),
                JoinGroupRequest {
                    code: group.code.clone(),
                },
            )
            .await
            .unwrap();
    }

    let owner_leave = groups.leave(&owner, &group.id).await;
    assert!(matches!(owner_leave, Err(AppError::ValidationError(_))));

    groups
        .leave(&Harness::claims_for(&first), &group.id)
        .await
        .unwrap();

    let after = groups.get(&owner, &group.id).await.unwrap();
    let member_ids: HashSet<String> = after.members.iter().map(|m| m.id.clone()).collect();
    let expected: HashSet<String> = [teacher.id.clone(), second.id.clone()].into_iter().collect();
    assert_eq!(member_ids, expected);
}

#[tokio::test]
async fn test_join_is_idempotent() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let groups = &harness.state.group_service;

    let group = groups
        .create(
            &Harness::claims_for(&teacher),
            CreateGroupRequest {
                name: "Physics".to_string(),
            },
        )
        .await
        .unwrap();
    for _ in 0..2 {
        groups
            .join(
                &Harness::claims_for(&student),
                JoinGroupRequest {
                    code: group.code.clone(),
                },
            )
            .await
            .unwrap();
    }

    let stored = harness.repos.groups.find_by_id(&group.id).await.unwrap().unwrap();
    assert_eq!(stored.members.len(), 2);
}

fn code_quiz_request(code: &str, enabled: bool) -> QuizRequest {
    QuizRequest {
        title: format!("Quiz behind {}", code),
        category: "Trivia".to_string(),
        time_limit_minutes: 10,
        marks_per_question: None,
        questions: vec![QuestionInput {
            id: None,
            text: "1 + 1?".to_string(),
            options: vec!["1".to_string(), "2".to_string()],
            correct_index: 1,
        }],
        is_enabled: Some(enabled),
        single_attempt: None,
        access_type: Some(AccessType::Code),
        access_code: Some(code.to_string()),
        group_id: None,
    }
}

#[tokio::test]
async fn test_removed_member_cannot_submit_group_quiz() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let owner = Harness::claims_for(&teacher);
    let actor = Harness::claims_for(&student);
    let groups = &harness.state.group_service;

    let group = groups
        .create(
            &owner,
            CreateGroupRequest {
                name: "Biology".to_string(),
            },
        )
        .await
        .unwrap();
    groups
        .join(
            &actor,
            JoinGroupRequest {
                code: group.code.clone(),
            },
        )
        .await
        .unwrap();

    let mut quiz = sample_quiz(&teacher.id);
    quiz.access_type = AccessType::Group;
    quiz.group_id = Some(group.id.clone());
    let quiz = harness.seed_quiz(quiz).await;

    harness
        .state
        .quiz_service
        .get_for_attempt(&actor, &quiz.id, None)
        .await
        .unwrap();
    groups
        .remove_member(&owner, &group.id, &student.id)
        .await
        .unwrap();

    let result = harness
        .state
        .attempt_service
        .submit_attempt(&actor, &quiz.id, submission(&quiz, &[0, 2, 1]))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(harness.state.attempt_service.my_attempts(&actor).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_code_quiz_submission_checks_code() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let mut quiz = sample_quiz(&teacher.id);
    quiz.access_type = AccessType::Code;
    quiz.access_code = Some("KEEP4321".to_string());
    quiz.access_code_hash = Some(hash_access_code("KEEP4321"));
    let quiz = harness.seed_quiz(quiz).await;
    let actor = Harness::claims_for(&student);
    let attempts = &harness.state.attempt_service;

    let without = attempts
        .submit_attempt(&actor, &quiz.id, submission(&quiz, &[0, 2, 1]))
        .await;
    assert!(matches!(without, Err(AppError::Forbidden(_))));

    let mut wrong = submission(&quiz, &[0, 2, 1]);
    wrong.access_code = Some("NOPE0000".to_string());
    let with_wrong = attempts.submit_attempt(&actor, &quiz.id, wrong).await;
    assert!(matches!(with_wrong, Err(AppError::Forbidden(_))));

    let mut right = submission(&quiz, &[0, 2, 1]);
    right.access_code = Some("keep4321".to_string());
    let accepted = attempts.submit_attempt(&actor, &quiz.id, right).await.unwrap();
    assert_eq!(accepted.score, 3);
}

#[tokio::test]
async fn test_disabled_quiz_rejects_submission() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let quiz = harness.seed_quiz(sample_quiz(&teacher.id)).await;
    let actor = Harness::claims_for(&student);

    harness
        .state
        .quiz_service
        .get_for_attempt(&actor, &quiz.id, None)
        .await
        .unwrap();
    let toggled = harness
        .state
        .quiz_service
        .toggle(&Harness::claims_for(&teacher), &quiz.id)
        .await
        .unwrap();
    assert!(!toggled.is_enabled);

    let result = harness
        .state
        .attempt_service
        .submit_attempt(&actor, &quiz.id, submission(&quiz, &[0, 2, 1]))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_reenabling_quiz_with_taken_code_conflicts() {
    let harness = Harness::new();
    let (teacher, _) = harness.seed_user("Tina", UserRole::Teacher).await;
    let (student, _) = harness.seed_user("Sam", UserRole::Student).await;
    let owner = Harness::claims_for(&teacher);
    let quizzes = &harness.state.quiz_service;

    let dormant = quizzes
        .create(&owner, code_quiz_request("SHARED1", false))
        .await
        .unwrap();
    let active = quizzes
        .create(&owner, code_quiz_request("SHARED1", true))
        .await
        .unwrap();

    let result = quizzes.toggle(&owner, &dormant.id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let stored = harness
        .repos
        .quizzes
        .find_by_id(&dormant.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_enabled);

    let redeemed = quizzes
        .redeem_code(&Harness::claims_for(&student), "shared1")
        .await
        .unwrap();
    assert_eq!(redeemed.id, active.id);
}
