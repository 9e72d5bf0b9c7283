use std::sync::Arc;

use sea_orm::EntityTrait;
use serde_json::json;

use server::entity::application;

use crate::common::{
    FailingBlobStore, TestApp, routes, valid_application_fields, wait_for,
};

mod submit {
    use super::*;

    #[tokio::test]
    async fn valid_submission_creates_a_pending_application() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let res = app
            .submit_application(&valid_application_fields(), None, &token)
            .await;

        assert_eq!(res.status, 200, "submit failed: {}", res.text);
        assert!(res.body["id"].is_string(), "expected external uuid id");

        // Both status copies start at pending; last_email_status at "none".
        let row = application::Entity::find()
            .one(&app.db)
            .await
            .unwrap()
            .expect("application row should exist");
        assert_eq!(row.status_internal, application::ApplicationStatus::Pending);
        assert_eq!(row.status_public, application::ApplicationStatus::Pending);
        assert_eq!(row.last_email_status, "none");
        assert_eq!(row.uuid.to_string(), res.body["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn second_submission_fails_with_application_exists() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let first = app
            .submit_application(&valid_application_fields(), None, &token)
            .await;
        assert_eq!(first.status, 200, "first submit failed: {}", first.text);

        let res = app
            .submit_application(&valid_application_fields(), None, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "APPLICATION_EXISTS");

        // Still exactly one row.
        let count = application::Entity::find().all(&app.db).await.unwrap().len();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn missing_fields_are_reported_per_field() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let res = app
            .submit_application(&[("major", "CS")], None, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let errors = res.body["errors"]
            .as_object()
            .expect("errors object expected");
        assert!(errors.contains_key("class_year"));
        assert!(errors.contains_key("shirt_size"));
        assert!(!errors.contains_key("major"));
    }

    #[tokio::test]
    async fn long_answer_boundary_is_two_thousand_characters() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let exactly = "a".repeat(2000);
        let mut fields: Vec<(&str, &str)> = valid_application_fields()
            .into_iter()
            .filter(|(name, _)| *name != "longanswer_1")
            .collect();
        let mut with_max = fields.clone();
        with_max.push(("longanswer_1", exactly.as_str()));

        let res = app.submit_application(&with_max, None, &token).await;
        assert_eq!(res.status, 200, "2000 chars should pass: {}", res.text);

        let app = TestApp::spawn().await;
        let token = app.create_applicant("bob@example.edu").await;
        let too_long = "a".repeat(2001);
        fields.push(("longanswer_1", too_long.as_str()));
        let with_overflow = fields;

        let res = app.submit_application(&with_overflow, None, &token).await;
        assert_eq!(res.status, 400);
        let errors = res.body["errors"].as_object().unwrap();
        assert!(errors.contains_key("longanswer_1"));
    }

    #[tokio::test]
    async fn submission_with_resume_stores_the_blob() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let res = app
            .submit_application(
                &valid_application_fields(),
                Some(("resume.pdf", b"%PDF-1.4 fake".to_vec())),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "submit failed: {}", res.text);

        let uuid = res.body["id"].as_str().unwrap();
        let stored = app
            .blob_store
            .get(&format!("resumes/{uuid}"))
            .await
            .expect("resume blob should exist");
        assert_eq!(stored, b"%PDF-1.4 fake");

        let url = app
            .get_with_token(routes::APPLICATION_SELF_RESUME, &token)
            .await;
        assert_eq!(url.status, 200, "presign failed: {}", url.text);
        assert!(
            url.body["url"]
                .as_str()
                .unwrap()
                .contains(&format!("resumes/{uuid}"))
        );
        assert_eq!(url.body["expires_in_secs"], 600);
    }

    #[tokio::test]
    async fn failed_resume_upload_persists_nothing() {
        let app = TestApp::spawn_with(Arc::new(FailingBlobStore)).await;
        let token = app.create_applicant("alice@example.edu").await;

        let res = app
            .submit_application(
                &valid_application_fields(),
                Some(("resume.pdf", b"bytes".to_vec())),
                &token,
            )
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "STORAGE_ERROR");

        // The transaction was rolled back: no application exists.
        let own = app.get_with_token(routes::APPLICATION_SELF, &token).await;
        assert_eq!(own.status, 404);
        assert_eq!(own.body["code"], "NO_APPLICATION");
    }

    #[tokio::test]
    async fn confirmation_email_is_sent_after_submit() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let res = app
            .submit_application(&valid_application_fields(), None, &token)
            .await;
        assert_eq!(res.status, 200);

        wait_for(|| !app.mailer.sent().is_empty()).await;
        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.edu");

        // The send path never writes back to the record.
        let row = application::Entity::find()
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.last_email_status, "none");
    }

    #[tokio::test]
    async fn unknown_form_fields_are_ignored() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let mut fields = valid_application_fields();
        fields.push(("status_internal", "accepted"));
        fields.push(("role", "admin"));

        let res = app.submit_application(&fields, None, &token).await;
        assert_eq!(res.status, 200, "submit failed: {}", res.text);

        let row = application::Entity::find()
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status_internal, application::ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn submit_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::APPLICATION))
            .multipart(reqwest::multipart::Form::new().text("major", "CS"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 401);
    }
}

mod own_view {
    use super::*;

    #[tokio::test]
    async fn get_self_returns_submitted_values() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;

        let res = app.get_with_token(routes::APPLICATION_SELF, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["hackathon_count"], 3);
        assert_eq!(res.body["shirt_size"], "m");
        assert_eq!(res.body["major"], "Computer Science");
        assert_eq!(res.body["status"], "pending");
    }

    #[tokio::test]
    async fn get_self_without_application_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let res = app.get_with_token(routes::APPLICATION_SELF, &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NO_APPLICATION");
    }

    #[tokio::test]
    async fn get_self_never_exposes_internal_review_state() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;
        let id = app.first_application_id(&admin).await;
        let set = app
            .post_with_token(
                &routes::application_status(id),
                &json!({"status": "accepted"}),
                &admin,
            )
            .await;
        assert_eq!(set.status, 200);

        let res = app.get_with_token(routes::APPLICATION_SELF, &token).await;

        assert_eq!(res.status, 200);
        // The public projection still says pending and carries no
        // admin-only columns at all.
        assert_eq!(res.body["status"], "pending");
        assert!(res.body.get("status_internal").is_none());
        assert!(res.body.get("last_email_status").is_none());
        assert!(res.body.get("user_id").is_none());
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn partial_update_changes_only_supplied_fields() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;

        let res = app
            .update_application(&[("shirt_size", "xl")], None, &token)
            .await;

        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert_eq!(res.body["shirt_size"], "xl");
        assert_eq!(res.body["major"], "Computer Science");
        assert_eq!(res.body["hackathon_count"], 3);
    }

    #[tokio::test]
    async fn update_without_an_application_is_a_precondition_failure() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let res = app
            .update_application(&[("shirt_size", "xl")], None, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "NO_APPLICATION");
    }

    #[tokio::test]
    async fn update_with_an_invalid_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;

        let res = app
            .update_application(&[("shirt_size", "huge")], None, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let errors = res.body["errors"].as_object().unwrap();
        assert!(errors.contains_key("shirt_size"));
    }

    #[tokio::test]
    async fn failed_resume_upload_aborts_the_whole_update() {
        // Submit without a resume (no storage call), then make every
        // subsequent upload fail.
        let app = TestApp::spawn_with(Arc::new(FailingBlobStore)).await;
        let token = app.create_applicant("alice@example.edu").await;

        let submit = app
            .submit_application(&valid_application_fields(), None, &token)
            .await;
        assert_eq!(submit.status, 200, "submit failed: {}", submit.text);

        let res = app
            .update_application(
                &[("major", "Electrical Engineering")],
                Some(("resume.pdf", b"bytes".to_vec())),
                &token,
            )
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "STORAGE_ERROR");

        // Full abort: the non-resume field kept its prior value.
        let own = app.get_with_token(routes::APPLICATION_SELF, &token).await;
        assert_eq!(own.body["major"], "Computer Science");
        assert!(own.body["resume_filename"].is_null());
    }

    #[tokio::test]
    async fn resume_reupload_overwrites_the_same_object() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        let submit = app
            .submit_application(
                &valid_application_fields(),
                Some(("resume-v1.pdf", b"first".to_vec())),
                &token,
            )
            .await;
        assert_eq!(submit.status, 200);
        let uuid = submit.body["id"].as_str().unwrap().to_string();

        let update = app
            .update_application(&[], Some(("resume-v2.pdf", b"second".to_vec())), &token)
            .await;
        assert_eq!(update.status, 200, "update failed: {}", update.text);
        assert_eq!(update.body["resume_filename"], "resume-v2.pdf");

        let stored = app
            .blob_store
            .get(&format!("resumes/{uuid}"))
            .await
            .unwrap();
        assert_eq!(stored, b"second");
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn set_status_changes_internal_but_never_public() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;
        let id = app.first_application_id(&admin).await;

        let res = app
            .post_with_token(
                &routes::application_status(id),
                &json!({"status": "accepted"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "set status failed: {}", res.text);
        assert_eq!(res.body["status_internal"], "accepted");
        assert_eq!(res.body["status_public"], "pending");
        assert_eq!(res.body["user"]["email"], "alice@example.edu");

        let row = application::Entity::find()
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status_internal, application::ApplicationStatus::Accepted);
        assert_eq!(row.status_public, application::ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn every_decision_is_reachable_from_every_state() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;
        let id = app.first_application_id(&admin).await;

        for status in ["accepted", "rejected", "waitlisted", "accepted"] {
            let res = app
                .post_with_token(
                    &routes::application_status(id),
                    &json!({"status": status}),
                    &admin,
                )
                .await;
            assert_eq!(res.status, 200, "setting {status} failed: {}", res.text);
            assert_eq!(res.body["status_internal"], status);
        }
    }

    #[tokio::test]
    async fn pending_is_not_an_assignable_decision() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;
        let id = app.first_application_id(&admin).await;

        for bad in ["pending", "approved", ""] {
            let res = app
                .post_with_token(
                    &routes::application_status(id),
                    &json!({"status": bad}),
                    &admin,
                )
                .await;
            assert_eq!(res.status, 400, "accepted bad status {bad:?}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn set_status_on_missing_application_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;

        let res = app
            .post_with_token(
                &routes::application_status(9999),
                &json!({"status": "accepted"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn non_admin_cannot_set_status() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;
        let id = app.first_application_id(&admin).await;

        let res = app
            .post_with_token(
                &routes::application_status(id),
                &json!({"status": "accepted"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let row = application::Entity::find()
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status_internal, application::ApplicationStatus::Pending);
    }
}

mod admin_read {
    use super::*;

    #[tokio::test]
    async fn admin_list_contains_full_records_with_owner() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;

        let res = app.get_with_token(routes::APPLICATIONS, &admin).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 1);
        let record = &res.body["applications"][0];
        assert_eq!(record["status_internal"], "pending");
        assert_eq!(record["last_email_status"], "none");
        assert_eq!(record["user"]["email"], "alice@example.edu");
        assert!(record["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn admin_can_fetch_a_single_application_by_id() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;
        let id = app.first_application_id(&admin).await;

        let res = app.get_with_token(&routes::application(id), &admin).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["user"]["firstname"], "Test");
    }

    #[tokio::test]
    async fn non_admin_gets_no_application_data_from_admin_endpoints() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;

        let list = app.get_with_token(routes::APPLICATIONS, &token).await;
        assert_eq!(list.status, 403);
        assert_eq!(list.body["code"], "PERMISSION_DENIED");
        assert!(list.body.get("applications").is_none());

        let single = app.get_with_token(&routes::application(1), &token).await;
        assert_eq!(single.status, 403);
        assert!(single.body.get("major").is_none());
    }

    #[tokio::test]
    async fn admin_resume_url_requires_a_stored_resume() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(&valid_application_fields(), None, &token)
            .await;
        let id = app.first_application_id(&admin).await;

        let res = app
            .get_with_token(&routes::application_resume(id), &admin)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn admin_can_presign_an_applicants_resume() {
        let app = TestApp::spawn().await;
        let token = app.create_applicant("alice@example.edu").await;
        let admin = app.create_admin("admin@example.edu").await;

        app.submit_application(
            &valid_application_fields(),
            Some(("resume.pdf", b"bytes".to_vec())),
            &token,
        )
        .await;
        let id = app.first_application_id(&admin).await;

        let res = app
            .get_with_token(&routes::application_resume(id), &admin)
            .await;

        assert_eq!(res.status, 200, "presign failed: {}", res.text);
        assert!(res.body["url"].as_str().unwrap().contains("resumes/"));
    }
}
