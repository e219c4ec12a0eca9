use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::models::{board::Board, display_update::DisplayUpdate};

use super::renderers::Renderer;

/// Task: Owns the dashboard. Runs page load once, then applies every display
/// update and redraws. Ends when cancelled or when every sender is gone,
/// returning the final board.
#[tracing::instrument(skip_all)]
pub async fn task_render_display(
    token: CancellationToken,
    mut board: Board,
    mut renderer: impl Renderer,
    mut rx_display_update: Receiver<DisplayUpdate>,
) -> Board {
    info!("Started.");

    board.on_load();
    draw(&mut renderer, &board);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            update = rx_display_update.recv() => match update {
                Ok(update) => {
                    debug!("Got display update: {}", update);
                    board.apply(&update);
                    draw(&mut renderer, &board);
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Display fell behind, skipped {} updates.", skipped);
                },
                Err(RecvError::Closed) => {
                    info!("Display update channel closed.");
                    break;
                },
            },
        };
    }

    board
}

fn draw(renderer: &mut impl Renderer, board: &Board) {
    match renderer.render(board) {
        Ok(_) => trace!("Redrew display."),
        Err(e) => error!("Failed to render display. Error: {}", e),
    }
}
