use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn full_submission_flow_scores_and_breaks_down() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher01", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student01", "Ivan Petrov", "student-pass")
            .await;
    let genetics = test_support::insert_category(ctx.state.db(), "Genetics").await;
    let ecology = test_support::insert_category(ctx.state.db(), "Ecology").await;
    let test = test_support::insert_test(ctx.state.db(), "Midterm", &teacher.id).await;

    let q1 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &genetics.id,
        "What cross gives a 1:1 ratio?",
        &["AA x aa", "Aa x aa"],
        "Aa x aa",
    )
    .await;
    let q2 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &genetics.id,
        "Dihybrid F2 ratio?",
        &["9:3:3:1", "1:2:1"],
        "9:3:3:1",
    )
    .await;
    let q3 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &ecology.id,
        "What is a producer?",
        &["Plant", "Wolf"],
        "Plant",
    )
    .await;
    let q4 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &ecology.id,
        "Sunlight is a factor of which kind?",
        &["Abiotic", "Biotic"],
        "Abiotic",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": test.id,
                "answers": [
                    {"question_id": q1.id, "answer": "Aa x aa"},
                    {"question_id": q2.id, "answer": "1:2:1"},
                    {"question_id": q3.id, "answer": "Plant"},
                    {"question_id": q4.id, "answer": "Biotic"},
                ],
            })),
        ))
        .await
        .expect("submit test");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["score"], 50.0);
    assert_eq!(body["category_breakdown"]["Genetics"]["correct"], 1);
    assert_eq!(body["category_breakdown"]["Genetics"]["total"], 2);
    assert_eq!(body["category_breakdown"]["Genetics"]["percentage"], 50.0);
    assert_eq!(body["category_breakdown"]["Ecology"]["percentage"], 50.0);
    assert!(body["recommendation"].is_null());

    let answers =
        repositories::answers::list_for_student_test(ctx.state.db(), &student.id, &test.id)
            .await
            .expect("stored answers");
    assert_eq!(answers.len(), 4);
}

#[tokio::test]
async fn duplicate_submission_returns_conflict() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher02", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student02", "Anna", "student-pass").await;
    let category = test_support::insert_category(ctx.state.db(), "Evolution").await;
    let test = test_support::insert_test(ctx.state.db(), "Quiz", &teacher.id).await;
    let q1 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "Who proposed natural selection?",
        &["Darwin", "Lamarck"],
        "Darwin",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let payload = json!({
        "test_id": test.id,
        "answers": [{"question_id": q1.id, "answer": "Darwin"}],
    });

    let first = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(payload.clone()),
        ))
        .await
        .expect("first submission");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(payload),
        ))
        .await
        .expect("second submission");

    let status = second.status();
    let body = test_support::read_json(second).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");

    let results = repositories::results::list_by_user(ctx.state.db(), &student.id)
        .await
        .expect("results");
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn submission_with_foreign_question_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher03", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student03", "Oleg", "student-pass").await;
    let category = test_support::insert_category(ctx.state.db(), "Cell Biology").await;
    let test = test_support::insert_test(ctx.state.db(), "Quiz A", &teacher.id).await;
    let other_test = test_support::insert_test(ctx.state.db(), "Quiz B", &teacher.id).await;
    test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "Which organelle produces ATP?",
        &["Mitochondria", "Ribosome"],
        "Mitochondria",
    )
    .await;
    let foreign = test_support::insert_question(
        ctx.state.db(),
        &other_test.id,
        &category.id,
        "Where does translation happen?",
        &["Ribosome", "Nucleus"],
        "Ribosome",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": test.id,
                "answers": [{"question_id": foreign.id, "answer": "Ribosome"}],
            })),
        ))
        .await
        .expect("submit with foreign question");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let results = repositories::results::list_by_user(ctx.state.db(), &student.id)
        .await
        .expect("results");
    assert!(results.is_empty());
}

#[tokio::test]
async fn student_question_view_hides_answer_and_appends_abstain() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher04", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student04", "Mila", "student-pass").await;
    let category = test_support::insert_category(ctx.state.db(), "Biochemistry").await;
    let test = test_support::insert_test(ctx.state.db(), "Enzymes", &teacher.id).await;
    test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "What do enzymes lower?",
        &["Activation energy", "Temperature"],
        "Activation energy",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/student/tests/{}/questions", test.id),
            Some(&token),
            None,
        ))
        .await
        .expect("fetch questions");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let question = &body[0];
    assert!(question.get("correct_answer").is_none());
    let options = question["options"].as_array().expect("options");
    assert_eq!(options.last().unwrap(), "Не знаю");
    assert_eq!(options.len(), 3);
}

#[tokio::test]
async fn questions_blocked_after_submission() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher05", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student05", "Nika", "student-pass").await;
    let category = test_support::insert_category(ctx.state.db(), "Genetics").await;
    let test = test_support::insert_test(ctx.state.db(), "Retake Check", &teacher.id).await;
    let q1 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "Alleles of one gene sit on?",
        &["Homologous chromosomes", "Any chromosome"],
        "Homologous chromosomes",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let submit = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": test.id,
                "answers": [{"question_id": q1.id, "answer": "Не знаю"}],
            })),
        ))
        .await
        .expect("submit");
    assert_eq!(submit.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/student/tests/{}/questions", test.id),
            Some(&token),
            None,
        ))
        .await
        .expect("fetch questions again");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn available_tests_flags_taken_ones() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher06", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student06", "Pavel", "student-pass").await;
    let category = test_support::insert_category(ctx.state.db(), "Ecology").await;
    let taken = test_support::insert_test(ctx.state.db(), "Taken Test", &teacher.id).await;
    let fresh = test_support::insert_test(ctx.state.db(), "Fresh Test", &teacher.id).await;
    let q1 = test_support::insert_question(
        ctx.state.db(),
        &taken.id,
        &category.id,
        "Trophic levels start with?",
        &["Producers", "Consumers"],
        "Producers",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let submit = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": taken.id,
                "answers": [{"question_id": q1.id, "answer": "Producers"}],
            })),
        ))
        .await
        .expect("submit");
    assert_eq!(submit.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/student/available-tests",
            Some(&token),
            None,
        ))
        .await
        .expect("list available tests");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let listed = body.as_array().expect("tests array");
    assert_eq!(listed.len(), 2);
    let flag_for = |id: &str| {
        listed
            .iter()
            .find(|entry| entry["id"] == json!(id))
            .map(|entry| entry["already_taken"].clone())
            .expect("test listed")
    };
    assert_eq!(flag_for(&taken.id), json!(true));
    assert_eq!(flag_for(&fresh.id), json!(false));
}

#[tokio::test]
async fn detailed_result_reports_each_question() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher07", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student07", "Vera", "student-pass").await;
    let category = test_support::insert_category(ctx.state.db(), "Molecular Biology").await;
    let test = test_support::insert_test(ctx.state.db(), "Central Dogma", &teacher.id).await;
    let q1 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "DNA to RNA is called?",
        &["Transcription", "Translation"],
        "Transcription",
    )
    .await;
    let q2 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "RNA to protein is called?",
        &["Transcription", "Translation"],
        "Translation",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let submit = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": test.id,
                "answers": [
                    {"question_id": q1.id, "answer": "Transcription"},
                    {"question_id": q2.id, "answer": "Transcription"},
                ],
            })),
        ))
        .await
        .expect("submit");
    assert_eq!(submit.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/student/results/{}/detailed", test.id),
            Some(&token),
            None,
        ))
        .await
        .expect("detailed result");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["result"]["score"], 50.0);

    let questions = body["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["is_correct"], json!(true));
    assert_eq!(questions[0]["given_answer"], "Transcription");
    assert_eq!(questions[1]["is_correct"], json!(false));
    assert_eq!(questions[1]["correct_answer"], "Translation");
}

#[tokio::test]
async fn strict_policy_requires_every_question_answered() {
    let ctx = test_support::setup_strict_submission_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher09", "Teacher", "teacher-pass").await;
    let student =
        test_support::insert_student(ctx.state.db(), "student09", "Gleb", "student-pass").await;
    let category = test_support::insert_category(ctx.state.db(), "Evolution").await;
    let test = test_support::insert_test(ctx.state.db(), "Speciation", &teacher.id).await;
    let other_test = test_support::insert_test(ctx.state.db(), "Warmup", &teacher.id).await;
    let q1 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "Reproductive isolation leads to?",
        &["Speciation", "Convergence"],
        "Speciation",
    )
    .await;
    let q2 = test_support::insert_question(
        ctx.state.db(),
        &test.id,
        &category.id,
        "Homologous organs indicate?",
        &["Common ancestry", "Similar habitat"],
        "Common ancestry",
    )
    .await;
    let foreign = test_support::insert_question(
        ctx.state.db(),
        &other_test.id,
        &category.id,
        "Vestigial organs are?",
        &["Reduced remnants", "New adaptations"],
        "Reduced remnants",
    )
    .await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let partial = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": test.id,
                "answers": [{"question_id": q1.id, "answer": "Speciation"}],
            })),
        ))
        .await
        .expect("partial submission");
    let status = partial.status();
    let body = test_support::read_json(partial).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["detail"], "Every question must be answered");

    // Foreign ids win over the coverage check; the error names the id.
    let with_foreign = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": test.id,
                "answers": [
                    {"question_id": q1.id, "answer": "Speciation"},
                    {"question_id": foreign.id, "answer": "Reduced remnants"},
                ],
            })),
        ))
        .await
        .expect("submission with foreign question");
    let status = with_foreign.status();
    let body = test_support::read_json(with_foreign).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(
        body["detail"],
        format!("Question {} does not belong to this test", foreign.id)
    );

    let results = repositories::results::list_by_user(ctx.state.db(), &student.id)
        .await
        .expect("results");
    assert!(results.is_empty());

    let full = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/student/submit-test",
            Some(&token),
            Some(json!({
                "test_id": test.id,
                "answers": [
                    {"question_id": q1.id, "answer": "Speciation"},
                    {"question_id": q2.id, "answer": "Common ancestry"},
                ],
            })),
        ))
        .await
        .expect("full submission");
    let status = full.status();
    let body = test_support::read_json(full).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["score"], 100.0);
}

#[tokio::test]
async fn teacher_cannot_use_student_endpoints() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher08", "Teacher", "teacher-pass").await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/student/available-tests",
            Some(&token),
            None,
        ))
        .await
        .expect("list as teacher");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
