//! IBFT transition logic, split out from the `Protocol<M>` glue in `mod.rs`.

use super::messages::{Message, PreparedCert};
use super::state::{RoundState, State};
use crate::ctx_ext::Ctx;
use bftsim_types::id::{NodeId, TimerId};
use bftsim_types::time::st;

fn round_timeout(base_time_limit: f64, view: u64) -> f64 {
    base_time_limit * 2f64.powi(view as i32)
}

/// Enters `NEW_ROUND` for `(instance, view)`: arms the round timer and, if
/// this validator is the leader, broadcasts `PREPREPARE` and advances
/// straight to `PREPREPARED`.
pub fn enter_new_round(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    instance: u64,
    view: u64,
) {
    state.reset_round(instance, view);
    state.transition(ctx.now().into_inner(), RoundState::NewRound);

    let timeout = round_timeout(base_time_limit, view);
    let timer = ctx.set_timer(st(timeout));
    state.active_timer = Some(timer);

    if state.is_leader(instance, view) {
        let block = state
            .prepared_cert
            .map(|cert| cert.block_hash)
            .unwrap_or_else(|| ctx.rng_u64());
        state.proposed_block = Some(block);
        let _ = ctx.broadcast(&Message::PrePrepare {
            instance,
            view,
            block,
        });
        enter_preprepared(state, ctx, base_time_limit, instance, view, block);
    }
}

/// Common tail of "a validator has a block to vote on for `(instance,
/// view)`": broadcasts `PREPARE` and records its own vote, exactly as a
/// validator receiving that `PREPARE` back from the wire would.
fn enter_preprepared(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    instance: u64,
    view: u64,
    block: u64,
) {
    state.transition(ctx.now().into_inner(), RoundState::PrePrepared);
    let _ = ctx.broadcast(&Message::Prepare {
        instance,
        view,
        block_hash: block,
    });
    state
        .tally
        .prepare_votes
        .entry(block)
        .or_default()
        .insert(state.id);
    maybe_advance_on_prepare_quorum(state, ctx, base_time_limit, instance, view, block);
}

fn maybe_advance_on_prepare_quorum(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    instance: u64,
    view: u64,
    block_hash: u64,
) {
    if state.round != RoundState::PrePrepared {
        return;
    }
    let quorum = state.quorum();
    let have = state
        .tally
        .prepare_votes
        .get(&block_hash)
        .map(|v| v.len())
        .unwrap_or(0);
    if have < quorum {
        return;
    }
    state.prepared_cert = Some(PreparedCert { view, block_hash });
    state.transition(ctx.now().into_inner(), RoundState::Prepared);
    let _ = ctx.broadcast(&Message::Commit {
        instance,
        view,
        block_hash,
    });
    state
        .tally
        .commit_votes
        .entry(block_hash)
        .or_default()
        .insert(state.id);
    maybe_decide(state, ctx, base_time_limit, instance, block_hash);
}

fn maybe_decide(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    instance: u64,
    block_hash: u64,
) {
    if state.round != RoundState::Prepared {
        return;
    }
    let quorum = state.quorum();
    let have = state
        .tally
        .commit_votes
        .get(&block_hash)
        .map(|v| v.len())
        .unwrap_or(0);
    if have < quorum {
        return;
    }
    state.transition(ctx.now().into_inner(), RoundState::Committed);
    state.consensus_count += 1;
    state.prepared_cert = None;
    let next_instance = instance + 1;
    enter_new_round(state, ctx, base_time_limit, next_instance, 0);
    if let Some(buffered) = state.pending.remove(&next_instance) {
        for (src, msg) in buffered {
            on_message(state, ctx, base_time_limit, src, msg);
        }
    }
}

pub fn on_message(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    src: NodeId,
    msg: Message,
) {
    if msg.instance() < state.current_instance {
        return;
    }
    if msg.instance() > state.current_instance {
        state
            .pending
            .entry(msg.instance())
            .or_default()
            .push((src, msg));
        return;
    }

    match msg {
        Message::PrePrepare {
            instance,
            view,
            block,
        } => {
            if view != state.current_view || state.round != RoundState::NewRound {
                return;
            }
            if state.is_leader(instance, view) {
                return;
            }
            state.proposed_block = Some(block);
            enter_preprepared(state, ctx, base_time_limit, instance, view, block);
        }
        Message::Prepare {
            instance,
            view,
            block_hash,
        } => {
            if view != state.current_view {
                return;
            }
            state
                .tally
                .prepare_votes
                .entry(block_hash)
                .or_default()
                .insert(src);
            maybe_advance_on_prepare_quorum(state, ctx, base_time_limit, instance, view, block_hash);
        }
        Message::Commit {
            instance,
            view,
            block_hash,
        } => {
            if view != state.current_view {
                return;
            }
            state
                .tally
                .commit_votes
                .entry(block_hash)
                .or_default()
                .insert(src);
            maybe_decide(state, ctx, base_time_limit, instance, block_hash);
        }
        Message::RoundChange {
            instance,
            view,
            prepared_cert,
        } => {
            if view <= state.current_view {
                return;
            }
            state
                .tally
                .round_change_votes
                .entry(view)
                .or_default()
                .insert(src);
            if let Some(cert) = prepared_cert {
                if state
                    .prepared_cert
                    .map(|existing| cert.view > existing.view)
                    .unwrap_or(true)
                {
                    state.prepared_cert = Some(cert);
                }
            }
            maybe_round_change(state, ctx, base_time_limit, instance);
        }
    }
}

pub fn on_timer(state: &mut State, ctx: &mut Ctx<Message>, base_time_limit: f64, timer: TimerId) {
    if state.active_timer != Some(timer) {
        return;
    }
    let instance = state.current_instance;
    let next_view = state.current_view + 1;
    state.transition(ctx.now().into_inner(), RoundState::RoundChange);
    state.active_timer = None;
    let _ = ctx.broadcast(&Message::RoundChange {
        instance,
        view: next_view,
        prepared_cert: state.prepared_cert,
    });
    state
        .tally
        .round_change_votes
        .entry(next_view)
        .or_default()
        .insert(state.id);
    maybe_round_change(state, ctx, base_time_limit, instance);
}

fn maybe_round_change(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    instance: u64,
) {
    if state.round != RoundState::RoundChange {
        return;
    }
    let quorum = state.quorum();
    let winning_view = state
        .tally
        .round_change_votes
        .iter()
        .filter(|(view, voters)| **view >= state.current_view + 1 && voters.len() >= quorum)
        .map(|(view, _)| *view)
        .min();
    if let Some(view) = winning_view {
        enter_new_round(state, ctx, base_time_limit, instance, view);
    }
}
