use std::time::Duration;

use anyhow::Result;
use shakmaty::{CastlingMode, Chess, Color};
use tracing::info;

use kestrel_engine::Player;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("kestrel starting");

    let pos = Chess::default();
    let mut player = Player::search(Color::White, 6, Duration::from_secs_f64(5.0), None, None);
    let mv = player.choose_move(&pos)?;
    info!(mv = %mv.to_uci(CastlingMode::Standard), "chose a move from the starting position");

    Ok(())
}
