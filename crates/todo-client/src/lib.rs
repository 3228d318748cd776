//! ブラウザ側コントローラーのロジック
//!
//! 状態（`ClientState`）と表示モデルの計算（`ViewModel`）は純粋な関数で、
//! 描画・通知は `Ui`、通信は `TodoApi` を境界として切り離しています。

pub mod api;
pub mod controller;
pub mod state;
pub mod view;

pub use api::*;
pub use controller::*;
pub use state::*;
pub use view::*;
