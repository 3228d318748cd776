use domain::{TodoFilter, TodoStats};
use todo_api::{app, AppState};
use todo_client::{render_html, HttpTodoApi, TodoApi, TodoController, Ui, ViewModel};
use tokio::net::TcpListener;

#[derive(Default)]
struct ScriptedUi {
    last_html: String,
    alerts: Vec<String>,
}

impl Ui for ScriptedUi {
    fn render(&mut self, view: &ViewModel) {
        self.last_html = render_html(view);
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, _message: &str) -> bool {
        true
    }
}

/// エフェメラルポートでサーバーを起動し、ベース URL を返す
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(AppState::default())).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_controller_round_trip_over_http() {
    let base_url = spawn_server().await;
    let mut controller = TodoController::new(HttpTodoApi::new(&base_url), ScriptedUi::default());
    controller.init().await;
    assert!(controller.state().todos.is_empty());

    controller.add("Buy milk").await;
    controller.add("Walk dog").await;
    assert_eq!(controller.state().todos[0].text.as_str(), "Walk dog");

    let milk = controller.state().todos[1].id.clone();
    controller.toggle(&milk).await;
    assert_eq!(controller.state().stats, TodoStats::from_counts(2, 1));

    controller.set_filter(TodoFilter::Active).await;
    assert_eq!(controller.state().todos.len(), 1);
    assert_eq!(controller.state().todos[0].text.as_str(), "Walk dog");

    controller.set_filter(TodoFilter::All).await;
    controller.clear_completed().await;
    assert_eq!(controller.state().todos.len(), 1);
    assert_eq!(controller.state().stats, TodoStats::from_counts(1, 0));
    assert!(controller.ui().last_html.contains("Walk dog"));
    assert!(controller.ui().alerts.is_empty());
}

#[tokio::test]
async fn test_server_error_message_is_alerted() {
    let base_url = spawn_server().await;
    let mut controller = TodoController::new(HttpTodoApi::new(&base_url), ScriptedUi::default());
    controller.init().await;

    controller.add(&"x".repeat(501)).await;

    assert!(controller.state().todos.is_empty());
    assert_eq!(
        controller.ui().alerts,
        vec!["Error: Todo text cannot exceed 500 characters".to_string()]
    );
}

#[tokio::test]
async fn test_http_api_reports_counts() {
    let base_url = spawn_server().await;
    let api = HttpTodoApi::new(&base_url);

    let a = api.create("A").await.unwrap();
    api.create("B").await.unwrap();
    api.update(&a.id, &todo_client::UpdateTodo::completed(true))
        .await
        .unwrap();

    assert_eq!(api.delete_completed().await.unwrap(), 1);
    assert_eq!(api.delete_all().await.unwrap(), 1);
    assert_eq!(api.stats().await.unwrap(), TodoStats::default());
}

#[tokio::test]
async fn test_unreachable_server_is_reported_as_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut controller =
        TodoController::new(HttpTodoApi::new(format!("http://{addr}")), ScriptedUi::default());
    controller.init().await;

    controller.add("Buy milk").await;

    assert!(controller.state().todos.is_empty());
    assert_eq!(
        controller.ui().alerts,
        vec!["Failed to add todo. Please try again.".to_string()]
    );
}
