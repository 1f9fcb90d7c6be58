//! Game command dispatch
//!
//! Commands are single lowercase words; anything else gets the help line.
//! Store failures surface as a generic notice and leave the session open —
//! the request is not retried.

use crate::server::GameContext;
use tracing::error;
use trionfi_coord::DuelTicket;
use trionfi_core::Card;

/// What the session loop should do with the reply.
pub enum CommandOutcome {
    Reply(String),
    Quit(String),
}

pub const STORE_FAILURE_NOTICE: &str = "Falha ao acessar o armazenamento. Tente novamente.";
const HELP: &str = "Comandos: listar, pegar, mao, duelo, sair";
const COMMON_SAMPLE: usize = 10;

pub async fn handle_command(
    context: &GameContext,
    player_id: &str,
    line: &str,
) -> CommandOutcome {
    match line.to_lowercase().as_str() {
        "listar" => CommandOutcome::Reply(listing(context)),
        "pegar" => CommandOutcome::Reply(draw_pack(context, player_id).await),
        "mao" => CommandOutcome::Reply(show_hand(context, player_id).await),
        "duelo" => CommandOutcome::Reply(enqueue_duel(context, player_id).await),
        "sair" => CommandOutcome::Quit("Até mais.".to_string()),
        _ => CommandOutcome::Reply(HELP.to_string()),
    }
}

fn card_lines(out: &mut String, cards: &[Card]) {
    for card in cards {
        out.push_str(&card.to_string());
        out.push('\n');
    }
}

/// Rares still in this process's advisory cache, plus a sample of commons.
/// The cache may briefly list a rare another process just claimed; the
/// claim path corrects that, not the listing.
fn listing(context: &GameContext) -> String {
    let mut out = String::from("Cartas raras disponíveis:\n");
    card_lines(&mut out, &context.cache.cards());
    out.push_str("\nCartas comuns (exemplo):\n");
    let commons = context.catalog.commons();
    card_lines(&mut out, &commons[..COMMON_SAMPLE.min(commons.len())]);
    out.trim_end().to_string()
}

async fn draw_pack(context: &GameContext, player_id: &str) -> String {
    let pack = context.engine.draw_pack(player_id).await;
    match context.hands.append(player_id, &pack).await {
        Ok(_) => {
            let mut out = String::from("CARTAS_RECEBIDAS:\n");
            card_lines(&mut out, &pack);
            out.trim_end().to_string()
        }
        Err(e) => {
            // Any rare claimed for this pack stays claimed; the pack itself
            // is not retried.
            error!(player_id, error = %e, "failed to persist drawn pack");
            STORE_FAILURE_NOTICE.to_string()
        }
    }
}

async fn show_hand(context: &GameContext, player_id: &str) -> String {
    match context.hands.load(player_id).await {
        Ok(hand) if hand.is_empty() => "Sua mão está vazia.".to_string(),
        Ok(hand) => {
            let mut out = String::from("Sua mão:\n");
            for (i, card) in hand.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, card));
            }
            out.trim_end().to_string()
        }
        Err(e) => {
            error!(player_id, error = %e, "failed to load hand");
            STORE_FAILURE_NOTICE.to_string()
        }
    }
}

async fn enqueue_duel(context: &GameContext, player_id: &str) -> String {
    let ticket = DuelTicket {
        player_id: player_id.to_string(),
        server_id: context.server_id.clone(),
    };
    match context.duels.enqueue(&ticket).await {
        Ok(()) => "Você entrou na fila de duelo (distribuída).".to_string(),
        Err(e) => {
            error!(player_id, error = %e, "failed to enqueue duel ticket");
            STORE_FAILURE_NOTICE.to_string()
        }
    }
}
