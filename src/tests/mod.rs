//! Integration tests against an in-process Bloggit backend.


use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use self::backend::Backend;
use crate::api::ApiClient;
use crate::app::{App, Page};
use crate::auth::TokenStore;
use crate::cli::{self, render, Command, Flow};
use crate::config::Config;
use crate::grammar::{FixOutcome, GrammarChecker};
use crate::models::ImageFile;
use crate::routes::Route;
use crate::session::SessionState;
use crate::views::header::MenuItem;
use crate::views::{
    blog, BlogView, FormMode, Header, HomeView, LoginForm, Navigation, PostForm, RegisterForm,
    FIELDS_REQUIRED,
};
use crate::AppState;

/// Test fixture for integration tests.
struct TestFixture {
    backend: Backend,
    state: AppState,
    token_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let token_path = temp_dir.path().join("token");

        // Start the backend on a random port
        let backend = Backend::default();
        let base_url = backend.serve().await;

        let mut config = Config::for_backend(base_url, &token_path);
        tweak(&mut config);

        let tokens = TokenStore::open(&token_path)
            .await
            .expect("Failed to open token store");
        let state = AppState::new(config, tokens).expect("Failed to build state");

        TestFixture {
            backend,
            state,
            token_path,
            _temp_dir: temp_dir,
        }
    }

    /// A fixture logged in as Ada.
    async fn signed_in() -> Self {
        let fixture = Self::new().await;
        fixture
            .backend
            .add_user("Ada", "ada@example.com", "secret");
        let navigation = fixture.login("ada@example.com", "secret").await;
        assert_eq!(navigation, Some(Route::Home));
        fixture
    }

    async fn login(&self, email: &str, password: &str) -> Navigation {
        let form = LoginForm {
            email: email.to_string(),
            password: password.to_string(),
        };
        form.submit(&self.state).await
    }

    async fn open_form(&self, mode: FormMode) -> PostForm<ApiClient> {
        PostForm::open(&self.state, mode, Arc::new(self.state.api.clone()))
            .await
            .ok()
            .expect("Form should open")
    }

    fn last_toast(&self) -> String {
        self.state
            .notifier
            .last()
            .map(|t| t.message)
            .unwrap_or_default()
    }

    fn request_mark(&self) -> usize {
        self.backend.requests().len()
    }

    fn requests_since(&self, mark: usize) -> Vec<String> {
        self.backend.requests()[mark..].to_vec()
    }
}

#[tokio::test]
async fn test_register_login_logout() {
    let fixture = TestFixture::new().await;

    let mut form = RegisterForm::default();
    for (field, value) in [
        ("name", "Ada Lovelace"),
        ("username", "ada"),
        ("email", "ada@example.com"),
        ("password", "secret"),
        ("role", "author"),
    ] {
        assert!(form.set(field, value), "{}", field);
    }
    assert_eq!(form.submit(&fixture.state).await, Some(Route::Login));
    assert_eq!(fixture.last_toast(), "Registration successful! Please log in.");

    // The backend's own message is shown as is
    assert_eq!(form.submit(&fixture.state).await, None);
    assert_eq!(fixture.last_toast(), "User already exists");

    assert_eq!(
        fixture.login("ada@example.com", "secret").await,
        Some(Route::Home)
    );
    assert_eq!(fixture.last_toast(), "Logged in successfully!");
    let saved = std::fs::read_to_string(&fixture.token_path).unwrap();
    assert!(saved.starts_with("token-"));

    let mut header = Header::load(&fixture.state).await;
    assert_eq!(
        header.items()[0],
        MenuItem::Greeting("Ada Lovelace".to_string())
    );

    assert_eq!(header.logout(&fixture.state).await, Some(Route::Login));
    assert_eq!(fixture.last_toast(), "Logged out successfully!");
    assert!(header.session().is_none());
    assert!(!fixture.token_path.exists());
    assert_eq!(fixture.state.session.peek().await, SessionState::Anonymous);
}

#[tokio::test]
async fn test_login_failures() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .add_user("Ada", "ada@example.com", "secret");

    assert_eq!(fixture.login("ada@example.com", "wrong").await, None);
    assert_eq!(fixture.last_toast(), "Invalid credentials");
    assert!(fixture.state.api.tokens().get().is_none());

    // Empty fields never reach the backend
    let mark = fixture.request_mark();
    assert_eq!(fixture.login("", "secret").await, None);
    assert_eq!(fixture.last_toast(), FIELDS_REQUIRED);
    assert!(fixture.requests_since(mark).is_empty());
}

#[tokio::test]
async fn test_failed_logout_keeps_session() {
    let fixture = TestFixture::signed_in().await;
    fixture.backend.fail_logout(true);

    let mut header = Header::load(&fixture.state).await;
    assert_eq!(header.logout(&fixture.state).await, None);
    assert_eq!(fixture.last_toast(), "Logout failed.");
    assert!(header.session().is_some());
    assert!(fixture.state.api.tokens().get().is_some());
    assert!(fixture.token_path.exists());
}

#[tokio::test]
async fn test_rejected_token_is_anonymous() {
    let fixture = TestFixture::new().await;
    fixture.state.api.tokens().set("stale").await.unwrap();

    assert!(fixture.state.session.current().await.is_none());
    assert!(fixture.state.api.tokens().get().is_none());
    assert!(!fixture.token_path.exists());

    // Anonymous readers get the landing page and no feed request
    let mark = fixture.request_mark();
    assert!(matches!(
        HomeView::load(&fixture.state).await,
        HomeView::Landing
    ));
    assert_eq!(fixture.backend.count("GET", "/api/blogs"), 0);
    assert!(fixture.requests_since(mark).is_empty());
}

#[tokio::test]
async fn test_write_post_from_the_command_line() {
    let fixture = TestFixture::signed_in().await;
    let mut app = App::start(fixture.state.clone()).await;
    assert!(matches!(app.page(), Page::Home(HomeView::Feed(posts)) if posts.is_empty()));

    for line in [
        "write",
        "title First post",
        "type Hello world, this is my first post.",
        "select 0 5",
        "format bold",
        "submit",
    ] {
        let command = Command::parse(line).unwrap();
        let result = cli::execute(&mut app, command).await;
        assert_eq!(result.ok(), Some(Flow::Continue), "{}", line);
    }

    assert_eq!(app.route(), &Route::Home);
    let Page::Home(view) = app.page() else {
        panic!("expected the home page");
    };
    assert_eq!(view.posts().len(), 1);
    assert_eq!(view.posts()[0].title, "First post");
    assert_eq!(view.posts()[0].author, "Ada");
    assert_eq!(fixture.backend.count("POST", "/api/blogs"), 1);
    assert!(fixture
        .state
        .notifier
        .drain()
        .iter()
        .any(|t| t.message == "Blog created successfully!"));

    let saved = &fixture.backend.posts()[0];
    assert!(saved.content.contains("<strong>Hello</strong> world, this is my first post."));
    assert!(render::app(&app).contains("First post"));
}

#[tokio::test]
async fn test_blank_post_makes_no_request() {
    let fixture = TestFixture::signed_in().await;

    for (title, body) in [("", "Body text"), ("   ", "Body"), ("Title", "   \n  ")] {
        let mut form = fixture.open_form(FormMode::Create).await;
        form.set_title(title);
        form.type_text(body);

        let mark = fixture.request_mark();
        assert_eq!(form.submit(&fixture.state).await, None);
        assert!(fixture.requests_since(mark).is_empty(), "{:?}", title);
        assert_eq!(fixture.last_toast(), "Title and content cannot be empty.");
    }

    let mut form = fixture.open_form(FormMode::Create).await;
    form.set_title("Title");
    assert_eq!(form.submit(&fixture.state).await, None);
    assert_eq!(fixture.backend.count("POST", "/api/blogs"), 0);
}

#[tokio::test]
async fn test_save_failures_show_backend_message() {
    let fixture = TestFixture::signed_in().await;

    let mut form = fixture.open_form(FormMode::Create).await;
    form.set_title("duplicate");
    form.type_text("Some content here.");
    assert_eq!(form.submit(&fixture.state).await, None);
    assert_eq!(
        fixture.last_toast(),
        "A post with this title already exists"
    );

    // No message in the body falls back to the generic text
    form.set_title("explode");
    assert_eq!(form.submit(&fixture.state).await, None);
    assert_eq!(fixture.last_toast(), "Failed to save blog post");
    assert!(fixture.backend.posts().is_empty());
}

#[tokio::test]
async fn test_edit_loads_and_updates() {
    let fixture = TestFixture::signed_in().await;
    let id = fixture
        .backend
        .add_post("Old title", "<p>Old body</p>", "Ada");

    let mut form = fixture.open_form(FormMode::Edit(id.clone())).await;
    assert_eq!(form.title, "Old title");
    assert_eq!(form.editor().plain_text(), "Old body\n");

    form.set_title("New title");
    form.type_text(" and more");
    assert_eq!(form.submit(&fixture.state).await, Some(Route::Home));
    assert_eq!(fixture.last_toast(), "Blog updated successfully!");

    let saved = &fixture.backend.posts()[0];
    assert_eq!(saved.id, id);
    assert_eq!(saved.title, "New title");
    assert!(saved.content.contains("Old body and more"));
    assert_eq!(fixture.backend.count("PUT", &format!("/api/blogs/{}", id)), 1);
}

#[tokio::test]
async fn test_edit_of_missing_post_goes_home() {
    let fixture = TestFixture::signed_in().await;
    let mut app = App::start(fixture.state.clone()).await;

    app.navigate(Route::Edit("missing".to_string())).await;
    assert_eq!(app.route(), &Route::Home);
    assert!(matches!(app.page(), Page::Home(_)));
    assert!(fixture
        .state
        .notifier
        .drain()
        .iter()
        .any(|t| t.message == "Could not fetch blog post."));
}

#[tokio::test]
async fn test_missing_post_is_a_state() {
    let fixture = TestFixture::signed_in().await;

    let view = BlogView::load(&fixture.state, "nope").await;
    assert!(view.post.is_none());
    assert!(view.comments.is_empty());
    assert_eq!(fixture.backend.count("GET", "/api/blogs/nope/comments"), 0);

    let mut app = App::start(fixture.state.clone()).await;
    app.navigate(Route::Post("nope".to_string())).await;
    assert!(render::app(&app).contains(blog::NOT_FOUND));
}

#[tokio::test]
async fn test_comment_goes_to_the_head_without_refetch() {
    let fixture = TestFixture::signed_in().await;
    let id = fixture
        .backend
        .add_post("Post", "<p>Body</p>", "Bob");
    fixture.backend.add_comment(&id, "First!", "Bob");

    let mut view = BlogView::load(&fixture.state, &id).await;
    assert!(view.can_comment());
    assert_eq!(view.comments.len(), 1);

    let mark = fixture.request_mark();
    view.draft = "Great read!".to_string();
    view.submit_comment(&fixture.state).await.unwrap();

    assert_eq!(
        fixture.requests_since(mark),
        vec![format!("POST /api/blogs/{}/comments", id)]
    );
    assert_eq!(fixture.last_toast(), "Comment posted!");
    assert!(view.draft.is_empty());
    assert_eq!(view.responses_heading(), "Responses (2)");

    let head = &view.comments[0];
    assert!(head.is_provisional());
    assert_eq!(head.comment().text, "Great read!");
    assert_eq!(head.comment().author_name(), "Ada");
    assert_eq!(view.comments[1].comment().author_name(), "Bob");

    // The backend's list replaces the provisional entry
    view.refresh_comments(&fixture.state).await;
    assert_eq!(view.comments.len(), 2);
    assert!(view.comments.iter().all(|c| !c.is_provisional()));
    assert_eq!(view.comments[0].comment().text, "Great read!");
}

#[tokio::test]
async fn test_comment_rules() {
    let fixture = TestFixture::signed_in().await;
    let id = fixture
        .backend
        .add_post("Post", "<p>Body</p>", "Bob");

    let mut view = BlogView::load(&fixture.state, &id).await;
    let mark = fixture.request_mark();
    view.draft = "   ".to_string();
    assert!(view.submit_comment(&fixture.state).await.is_err());
    assert_eq!(fixture.last_toast(), "Comment cannot be empty.");

    // Logged-out readers are prompted instead
    fixture.state.session.logout().await.unwrap();
    let mut view = BlogView::load(&fixture.state, &id).await;
    assert!(!view.can_comment());
    view.draft = "Hello".to_string();
    assert!(view.submit_comment(&fixture.state).await.is_err());
    assert_eq!(fixture.last_toast(), blog::COMMENT_PROMPT);
    assert_eq!(
        fixture.backend.count("POST", &format!("/api/blogs/{}/comments", id)),
        0
    );
    assert!(!fixture
        .requests_since(mark)
        .iter()
        .any(|r| r.ends_with("/comments") && r.starts_with("POST")));
}

#[tokio::test]
async fn test_delete_post() {
    let fixture = TestFixture::signed_in().await;
    let id = fixture
        .backend
        .add_post("Doomed", "<p>Bye</p>", "Ada");

    let mut view = BlogView::load(&fixture.state, &id).await;
    assert_eq!(view.delete_post(&fixture.state).await, Some(Route::Home));
    assert_eq!(fixture.last_toast(), "Blog deleted.");
    assert!(fixture.backend.posts().is_empty());
}

#[tokio::test]
async fn test_image_upload() {
    let fixture = TestFixture::signed_in().await;
    let mut form = fixture.open_form(FormMode::Create).await;
    form.type_text("Look at this");
    let before = form.editor().document().clone();

    fixture.backend.fail_uploads(true);
    let image = ImageFile::new("cat.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47]);
    assert!(form
        .insert_image(&fixture.state.api, image.clone(), &fixture.state.notifier)
        .await
        .is_err());
    assert_eq!(form.editor().document(), &before);
    assert_eq!(fixture.last_toast(), "Image upload failed.");

    // Non-images are refused before any request
    let notes = ImageFile::new("notes.txt", "text/plain", b"hi".to_vec());
    assert!(form
        .insert_image(&fixture.state.api, notes, &fixture.state.notifier)
        .await
        .is_err());
    assert_eq!(fixture.last_toast(), "Please choose an image file.");
    assert_eq!(fixture.backend.count("POST", "/api/upload"), 1);

    fixture.backend.fail_uploads(false);
    form.insert_image(&fixture.state.api, image, &fixture.state.notifier)
        .await
        .unwrap();
    assert_eq!(form.editor().len(), before.len() + 1);
    assert!(form
        .editor()
        .html()
        .contains("https://cdn.test/uploads/cat.png"));
}

#[tokio::test]
async fn test_grammar_check_endpoint() {
    let fixture = TestFixture::new().await;

    let matches = fixture
        .state
        .api
        .check("Walk ot the dog\n".to_string())
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].offset, 5);
    assert_eq!(matches[0].length, 2);
    assert_eq!(matches[0].suggestion(), Some("to"));
}

#[tokio::test]
async fn test_grammar_issue_fixed_in_the_editor() {
    let fixture =
        TestFixture::with_config(|c| c.grammar_debounce = Duration::from_millis(50)).await;
    let mut form = fixture.open_form(FormMode::Create).await;
    let mut updates = form.grammar_updates();

    form.type_text("Walk ot the dog today");
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("No grammar result")
        .unwrap();
    form.sync_marks();

    let annotations = form.annotations();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].suggestion.as_deref(), Some("to"));
    assert!(render::document(form.editor().document()).contains("[[ot]]"));
    assert!(!form.editor().html().contains("grammar-error"));

    assert!(matches!(form.fix(0), FixOutcome::Applied { .. }));
    assert_eq!(form.editor().plain_text(), "Walk to the dog today\n");
    assert!(form.annotations().is_empty());
    assert_eq!(fixture.backend.count("POST", "/api/grammar-check"), 1);
}

#[tokio::test]
async fn test_grammar_result_published_mid_command_is_kept() {
    let fixture =
        TestFixture::with_config(|c| c.grammar_debounce = Duration::from_millis(50)).await;
    let mut form = fixture.open_form(FormMode::Create).await;
    let held = Some(form.grammar_updates());

    form.type_text("Walk ot the dog today");
    let mut watcher = form.grammar_updates();
    tokio::time::timeout(Duration::from_secs(5), watcher.changed())
        .await
        .expect("No grammar result")
        .unwrap();

    // A receiver taken now has already seen the result; the held one has not
    let fresh = form.grammar_updates();
    assert!(!fresh.has_changed().unwrap());
    let kept = crate::keep_subscription(held, Some(fresh)).unwrap();
    assert!(kept.has_changed().unwrap());
    assert_eq!(kept.borrow().issues.len(), 1);

    // Another editor replaces the subscription, leaving the editor drops it
    let other = fixture.open_form(FormMode::Create).await;
    let switched = crate::keep_subscription(Some(kept), Some(other.grammar_updates())).unwrap();
    assert!(switched.same_channel(&other.grammar_updates()));
    assert!(crate::keep_subscription(Some(switched), None).is_none());
}
