//! HotStuff pacemaker and phase-transition logic.

use super::messages::{Message, Qc};
use super::state::{Phase, State};
use crate::ctx_ext::Ctx;
use bftsim_types::id::{NodeId, TimerId};
use bftsim_types::time::st;

fn round_timeout(base_time_limit: f64, view: u64) -> f64 {
    base_time_limit * 2f64.powi(view as i32)
}

/// A proposal is safe to vote for if the replica has no `lockedQC` yet, or
/// the proposal's `highQC` is from a later view than the replica's
/// `lockedQC` (the simulator does not model a parent-block chain, so this is
/// the full safety check — see the spec's open question on this rule).
fn extends_or_newer(locked_qc: Option<Qc>, high_qc: Option<Qc>) -> bool {
    match (locked_qc, high_qc) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(locked), Some(high)) => high.view > locked.view,
    }
}

/// The QC from the later view, preferring `candidate` on a tie.
fn newer(candidate: Option<Qc>, incumbent: Option<Qc>) -> Option<Qc> {
    match (candidate, incumbent) {
        (Some(c), Some(i)) => Some(if c.view >= i.view { c } else { i }),
        (Some(c), None) => Some(c),
        (None, incumbent) => incumbent,
    }
}

pub fn enter_new_view(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    view: u64,
) {
    state.reset_round(view);
    state.transition(ctx.now().into_inner(), Phase::NewView);

    let timeout = round_timeout(base_time_limit, view);
    let timer = ctx.set_timer(st(timeout));
    state.active_timer = Some(timer);

    let prepare_qc = state.high_qc;
    if state.is_leader(view) {
        state.tally.new_view_voters.insert(state.id);
        state.tally.best_prepare_qc = prepare_qc;
    } else {
        let leader = state.leader_for(view);
        let _ = ctx.send(leader, &Message::NewView { view, prepare_qc });
    }
}

fn maybe_propose(state: &mut State, ctx: &mut Ctx<Message>, base_time_limit: f64, view: u64) {
    if state.phase != Phase::NewView || !state.is_leader(view) {
        return;
    }
    if state.tally.new_view_voters.len() < state.quorum() {
        return;
    }
    let high_qc = state.tally.best_prepare_qc;
    let block = high_qc.map(|qc| qc.block_hash).unwrap_or_else(|| ctx.rng_u64());
    state.proposed_block = Some(block);
    let _ = ctx.broadcast(&Message::Prepare {
        view,
        block,
        high_qc,
    });
    enter_prepare(state, ctx, base_time_limit, view, block, high_qc);
}

fn enter_prepare(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    view: u64,
    block: u64,
    high_qc: Option<Qc>,
) {
    state.transition(ctx.now().into_inner(), Phase::Prepare);
    state.high_qc = newer(high_qc, state.high_qc);
    if extends_or_newer(state.locked_qc, high_qc) {
        let leader = state.leader_for(view);
        if state.is_leader(view) {
            state
                .tally
                .prepare_votes
                .entry(block)
                .or_default()
                .insert(state.id);
        } else {
            let _ = ctx.send(leader, &Message::PrepareVote { view, block_hash: block });
        }
    }
    maybe_form_prepare_qc(state, ctx, base_time_limit, view, block);
}

fn maybe_form_prepare_qc(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    view: u64,
    block_hash: u64,
) {
    if state.phase != Phase::Prepare || !state.is_leader(view) {
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
    let qc = Qc { view, block_hash };
    let _ = ctx.broadcast(&Message::PreCommit { view, qc });
    enter_precommit(state, ctx, base_time_limit, view, qc);
}

fn enter_precommit(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    view: u64,
    qc: Qc,
) {
    state.transition(ctx.now().into_inner(), Phase::PreCommit);
    state.high_qc = newer(Some(qc), state.high_qc);
    let leader = state.leader_for(view);
    if state.is_leader(view) {
        state
            .tally
            .precommit_votes
            .entry(qc.block_hash)
            .or_default()
            .insert(state.id);
    } else {
        let _ = ctx.send(
            leader,
            &Message::PreCommitVote {
                view,
                block_hash: qc.block_hash,
            },
        );
    }
    maybe_form_precommit_qc(state, ctx, base_time_limit, view, qc.block_hash);
}

fn maybe_form_precommit_qc(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    view: u64,
    block_hash: u64,
) {
    if state.phase != Phase::PreCommit || !state.is_leader(view) {
        return;
    }
    let quorum = state.quorum();
    let have = state
        .tally
        .precommit_votes
        .get(&block_hash)
        .map(|v| v.len())
        .unwrap_or(0);
    if have < quorum {
        return;
    }
    let qc = Qc { view, block_hash };
    let _ = ctx.broadcast(&Message::Commit { view, qc });
    enter_commit(state, ctx, base_time_limit, view, qc);
}

fn enter_commit(state: &mut State, ctx: &mut Ctx<Message>, base_time_limit: f64, view: u64, qc: Qc) {
    state.transition(ctx.now().into_inner(), Phase::Commit);
    state.locked_qc = Some(qc);
    let leader = state.leader_for(view);
    if state.is_leader(view) {
        state
            .tally
            .commit_votes
            .entry(qc.block_hash)
            .or_default()
            .insert(state.id);
    } else {
        let _ = ctx.send(
            leader,
            &Message::CommitVote {
                view,
                block_hash: qc.block_hash,
            },
        );
    }
    maybe_form_commit_qc(state, ctx, base_time_limit, view, qc.block_hash);
}

fn maybe_form_commit_qc(
    state: &mut State,
    ctx: &mut Ctx<Message>,
    base_time_limit: f64,
    view: u64,
    block_hash: u64,
) {
    if state.phase != Phase::Commit || !state.is_leader(view) {
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
    let qc = Qc { view, block_hash };
    let _ = ctx.broadcast(&Message::Decide { view, qc });
    decide(state, ctx, base_time_limit, view);
}

fn decide(state: &mut State, ctx: &mut Ctx<Message>, base_time_limit: f64, view: u64) {
    state.transition(ctx.now().into_inner(), Phase::Decide);
    state.consensus_count += 1;
    let next_view = view + 1;
    enter_new_view(state, ctx, base_time_limit, next_view);
    drain_pending(state, ctx, base_time_limit, next_view);
}

fn drain_pending(state: &mut State, ctx: &mut Ctx<Message>, base_time_limit: f64, view: u64) {
    if let Some(buffered) = state.pending.remove(&view) {
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
    if msg.view() < state.current_view {
        return;
    }
    if msg.view() > state.current_view {
        state.pending.entry(msg.view()).or_default().push((src, msg));
        return;
    }

    match msg {
        Message::NewView { view, prepare_qc } => {
            if !state.is_leader(view) {
                return;
            }
            state.tally.new_view_voters.insert(src);
            if prepare_qc.map(|qc| qc.view) > state.tally.best_prepare_qc.map(|qc| qc.view) {
                state.tally.best_prepare_qc = prepare_qc;
            }
            maybe_propose(state, ctx, base_time_limit, view);
        }
        Message::Prepare {
            view,
            block,
            high_qc,
        } => {
            if state.phase != Phase::NewView || state.is_leader(view) {
                return;
            }
            state.proposed_block = Some(block);
            enter_prepare(state, ctx, base_time_limit, view, block, high_qc);
        }
        Message::PrepareVote { view, block_hash } => {
            state
                .tally
                .prepare_votes
                .entry(block_hash)
                .or_default()
                .insert(src);
            maybe_form_prepare_qc(state, ctx, base_time_limit, view, block_hash);
        }
        Message::PreCommit { view, qc } => {
            if state.phase != Phase::Prepare || state.is_leader(view) {
                return;
            }
            enter_precommit(state, ctx, base_time_limit, view, qc);
        }
        Message::PreCommitVote { view, block_hash } => {
            state
                .tally
                .precommit_votes
                .entry(block_hash)
                .or_default()
                .insert(src);
            maybe_form_precommit_qc(state, ctx, base_time_limit, view, block_hash);
        }
        Message::Commit { view, qc } => {
            if state.phase != Phase::PreCommit || state.is_leader(view) {
                return;
            }
            enter_commit(state, ctx, base_time_limit, view, qc);
        }
        Message::CommitVote { view, block_hash } => {
            state
                .tally
                .commit_votes
                .entry(block_hash)
                .or_default()
                .insert(src);
            maybe_form_commit_qc(state, ctx, base_time_limit, view, block_hash);
        }
        Message::Decide { view, .. } => {
            if state.phase != Phase::Commit || state.is_leader(view) {
                return;
            }
            decide(state, ctx, base_time_limit, view);
        }
    }
}

pub fn on_timer(state: &mut State, ctx: &mut Ctx<Message>, base_time_limit: f64, timer: TimerId) {
    if state.active_timer != Some(timer) {
        return;
    }
    let next_view = state.current_view + 1;
    enter_new_view(state, ctx, base_time_limit, next_view);
}
