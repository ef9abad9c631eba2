#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    use crate::models::role;
    use crate::tests::support::{
        body_json, body_text, create_user, get, login, login_request, setup, superuser_cookie, PASSWORD,
    };

    const ADMIN_LISTS: &[&str] = &["/admin/", "/admin/role/", "/admin/user/", "/admin/property/", "/admin/image/"];

    fn location(res: &axum::response::Response) -> &str {
        res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        let t = setup().await;
        let res = t.app.clone().oneshot(get("/admin/property/", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login?next=%2Fadmin%2Fproperty%2F");

        for uri in ADMIN_LISTS {
            let res = t.app.clone().oneshot(get(uri, None)).await.unwrap();
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_bogus_cookie_counts_as_anonymous() {
        let t = setup().await;
        let res = t
            .app
            .clone()
            .oneshot(get("/admin/role/", Some("realestate_session=not-a-real-token")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_non_superuser_is_forbidden() {
        let t = setup().await;
        create_user(&t.state, "viewer@example.com", &[role::USER]).await;
        let cookie = login(&t.app, "viewer@example.com").await;

        for uri in ADMIN_LISTS {
            let res = t.app.clone().oneshot(get(uri, Some(&cookie))).await.unwrap();
            assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", uri);
        }
        let res = t.app.clone().oneshot(get("/admin/user/", Some(&cookie))).await.unwrap();
        assert_eq!(body_json(res).await["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_superuser_sees_every_view() {
        let t = setup().await;
        let cookie = superuser_cookie(&t).await;

        for uri in ADMIN_LISTS {
            let res = t.app.clone().oneshot(get(uri, Some(&cookie))).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{}", uri);
        }

        let res = t.app.clone().oneshot(get("/admin/", Some(&cookie))).await.unwrap();
        let body = body_json(res).await;
        assert_eq!(body["title"], "Admin real estate");
        assert_eq!(body["user"], "admin@example.com");
        assert_eq!(body["views"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_deactivated_superuser_is_forbidden() {
        let t = setup().await;
        let cookie = superuser_cookie(&t).await;
        sqlx::query(r#"UPDATE "user" SET active = 0 WHERE email = 'admin@example.com'"#)
            .execute(&t.state.db)
            .await
            .unwrap();

        let res = t.app.clone().oneshot(get("/admin/property/", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie_and_follows_next() {
        let t = setup().await;
        create_user(&t.state, "admin@example.com", &[role::SUPERUSER]).await;

        let res = t
            .app
            .clone()
            .oneshot(login_request("admin@example.com", PASSWORD, Some("/admin/property/")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/admin/property/");
        let cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("realestate_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[tokio::test]
    async fn test_login_ignores_external_next() {
        let t = setup().await;
        create_user(&t.state, "admin@example.com", &[role::SUPERUSER]).await;

        let res = t
            .app
            .clone()
            .oneshot(login_request("admin@example.com", PASSWORD, Some("https://evil.example/")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/admin/");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let t = setup().await;
        create_user(&t.state, "admin@example.com", &[role::SUPERUSER]).await;

        let res = t.app.clone().oneshot(login_request("admin@example.com", "wrong", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        let wrong_password = body_json(res).await;

        let res = t.app.clone().oneshot(login_request("nobody@example.com", PASSWORD, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let unknown_email = body_json(res).await;

        // Both failures look the same to the client.
        assert_eq!(wrong_password["error"]["message"], unknown_email["error"]["message"]);
    }

    #[tokio::test]
    async fn test_login_refuses_disabled_account() {
        let t = setup().await;
        create_user(&t.state, "off@example.com", &[role::SUPERUSER]).await;
        sqlx::query(r#"UPDATE "user" SET active = 0 WHERE email = 'off@example.com'"#)
            .execute(&t.state.db)
            .await
            .unwrap();

        let res = t.app.clone().oneshot(login_request("off@example.com", PASSWORD, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["error"]["message"], "Account is disabled");
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let t = setup().await;
        let cookie = superuser_cookie(&t).await;

        let res = t.app.clone().oneshot(get("/logout", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/");
        let cleared = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let res = t.app.clone().oneshot(get("/admin/", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_login_page_renders_escaped_next() {
        let t = setup().await;
        let res = t
            .app
            .clone()
            .oneshot(get("/login?next=%2Fadmin%2Fimage%2F%3Fq%3D%22x%22", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Admin real estate"));
        assert!(html.contains("/admin/image/?q=&quot;x&quot;"));
    }

    #[tokio::test]
    async fn test_login_page_redirects_when_already_signed_in() {
        let t = setup().await;
        let cookie = superuser_cookie(&t).await;
        let res = t.app.clone().oneshot(get("/login?next=%2Fadmin%2Frole%2F", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/admin/role/");
    }

    #[tokio::test]
    async fn test_admin_without_slash_redirects() {
        let t = setup().await;
        let res = t.app.clone().oneshot(get("/admin", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(location(&res), "/admin/");
    }
}
