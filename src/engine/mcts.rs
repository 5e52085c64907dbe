//! UCT search with RAVE.
//!
//! Children are created lazily once a node has been visited often enough.
//! Selection blends each child's own winrate with its all-moves-as-first
//! statistics, trusting the latter less as real visits accumulate. New
//! children start with prior visits and wins from cheap shape heuristics.
//!
//! Win counts are kept from the point of view of the player whose move led
//! to the node, so a parent picks the child with the best winrate directly.

use std::collections::VecDeque;

use crate::constants::{
    EXPAND_VISITS, FASTPLAY5_THRES, FASTPLAY20_THRES, PASS, PRIOR_CAPTURE_MANY,
    PRIOR_CAPTURE_ONE, PRIOR_CFG, PRIOR_EMPTYAREA, PRIOR_EVEN, RAVE_EQUIV,
};
use crate::coord::{Coord, stride, to_rowcol};
use crate::engine::playout::mcplayout;
use crate::engine::position::{Color, Move, Point, Position, Stone};
use crate::engine::time::Budget;

/// Search parameters, adjustable through engine arguments.
#[derive(Copy, Clone, Debug)]
pub struct SearchParams {
    pub rave_equiv: usize,
    pub expand_visits: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            rave_equiv: RAVE_EQUIV,
            expand_visits: EXPAND_VISITS,
        }
    }
}

pub struct TreeNode {
    pub pos: Position,
    pub to_move: Color,
    /// Visits and wins
    pub v: u32,
    pub w: u32,
    /// Prior visits and wins
    pub pv: u32,
    pub pw: u32,
    /// All-moves-as-first visits and wins
    pub av: u32,
    pub aw: u32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(pos: &Position, to_move: Color) -> Self {
        Self {
            pos: pos.clone(),
            to_move,
            v: 0,
            w: 0,
            pv: PRIOR_EVEN,
            pw: PRIOR_EVEN / 2,
            av: 0,
            aw: 0,
            children: Vec::new(),
        }
    }

    fn last(&self) -> Option<Move> {
        self.pos.last_move
    }

    fn add_prior(&mut self, visits: u32, wins: u32) {
        self.pv += visits;
        self.pw += wins;
    }

    /// Observed winrate; unvisited nodes rank below every visited one.
    pub fn winrate(&self) -> f64 {
        match self.v {
            0 => -0.1,
            v => self.w as f64 / v as f64,
        }
    }

    /// Selection score: winrate including priors, blended with AMAF.
    fn urgency(&self, rave_equiv: usize) -> f64 {
        let v = (self.v + self.pv) as f64;
        let expectation = (self.w + self.pw) as f64 / v;
        if self.av == 0 {
            return expectation;
        }
        let av = self.av as f64;
        let rave = self.aw as f64 / av;
        let beta = av / (av + v + v * av / rave_equiv as f64);
        beta * rave + (1.0 - beta) * expectation
    }

    fn most_urgent(&self, rave_equiv: usize) -> usize {
        let mut best = 0;
        let mut best_u = f64::NEG_INFINITY;
        for (i, c) in self.children.iter().enumerate() {
            let u = c.urgency(rave_equiv);
            if u > best_u {
                best = i;
                best_u = u;
            }
        }
        best
    }

    /// Credit AMAF statistics to every child whose move the simulation played first.
    fn credit_amaf(&mut self, amaf: &[u8], winner: Color) {
        for child in &mut self.children {
            let Some(mv) = child.last() else { continue };
            if mv.coord >= 0 && amaf[mv.coord as usize] == amaf_mark(mv.color) {
                child.av += 1;
                child.aw += u32::from(winner == mv.color);
            }
        }
    }
}

/// Create a child for every sensible move of the player to move.
///
/// Own true eyes are never filled. A node with nothing else to play gets a
/// single pass child.
pub fn expand(node: &mut TreeNode) {
    if !node.children.is_empty() {
        return;
    }
    let color = node.to_move;
    let parent = &node.pos;
    let fate = parent
        .last_move
        .filter(|m| m.coord >= 0)
        .map(|m| fate_distances(parent, m.coord as Point));

    let mut children = Vec::new();
    for pt in parent.empty_points() {
        if parent.is_eye(pt) == Some(color) || !parent.is_legal(color, pt as Coord, true) {
            continue;
        }
        let mut pos = parent.clone();
        if pos.play(Move::new(pt as Coord, color)).is_err() {
            continue;
        }
        let mut child = TreeNode::new(&pos, color.opponent());
        apply_priors(&mut child, parent, color, pt, fate.as_deref());
        children.push(child);
    }

    if children.is_empty() {
        let mut pos = parent.clone();
        let _ = pos.play(Move::new(PASS, color));
        children.push(TreeNode::new(&pos, color.opponent()));
    }
    node.children = children;
}

fn apply_priors(child: &mut TreeNode, parent: &Position, color: Color, pt: Point, fate: Option<&[i16]>) {
    // Close to the last move
    if let Some(d) = fate.map(|f| f[pt]).filter(|&d| d >= 1) {
        if let Some(&bonus) = PRIOR_CFG.get(d as usize - 1) {
            child.add_prior(bonus, bonus);
        }
    }

    match capture_size(parent, color, pt) {
        0 => {}
        1 => child.add_prior(PRIOR_CAPTURE_ONE, PRIOR_CAPTURE_ONE),
        _ => child.add_prior(PRIOR_CAPTURE_MANY, PRIOR_CAPTURE_MANY),
    }

    // Low moves in an empty region are discouraged, except on the third line
    let height = edge_distance(parent, pt);
    if height <= 2 && no_stones_near(parent, pt, 3) {
        let wins = if height == 2 { PRIOR_EMPTYAREA } else { 0 };
        child.add_prior(PRIOR_EMPTYAREA, wins);
    }
}

/// Stones `color` would capture by playing at `pt`.
fn capture_size(pos: &Position, color: Color, pt: Point) -> u32 {
    let opp = Stone::from(color.opponent());
    let mut taken = Vec::new();
    for n in pos.neighbors(pt) {
        if pos.at(n as Coord) == opp && !taken.contains(&n) && pos.group_liberties(n) == 1 {
            pos.collect_group(n, &mut taken);
        }
    }
    taken.len() as u32
}

/// Common-fate-graph distances from `start`: steps between points over all
/// eight neighbors, where moving within a chain of one color is free.
fn fate_distances(pos: &Position, start: Point) -> Vec<i16> {
    let mut dist = vec![-1i16; stride(pos.size()).pow(2)];
    let mut queue = VecDeque::from([start]);
    dist[start] = 0;

    while let Some(pt) = queue.pop_front() {
        let here = pos.at(pt as Coord);
        for n in pos.all_neighbors(pt) {
            let s = pos.at(n as Coord);
            if s == Stone::Out {
                continue;
            }
            let step = if s != Stone::Empty && s == here { 0 } else { 1 };
            let d = dist[pt] + step;
            if dist[n] < 0 || d < dist[n] {
                dist[n] = d;
                queue.push_back(n);
            }
        }
    }
    dist
}

/// 0 on the first line, 1 on the second and so on.
fn edge_distance(pos: &Position, pt: Point) -> usize {
    let n = pos.size();
    to_rowcol(pt as Coord, n).map_or(0, |(r, c)| r.min(n - 1 - r).min(c).min(n - 1 - c))
}

/// No stone within `radius` orthogonal steps of `pt`.
fn no_stones_near(pos: &Position, pt: Point, radius: usize) -> bool {
    radius == 0
        || pos.neighbors(pt).into_iter().all(|n| match pos.at(n as Coord) {
            Stone::Black | Stone::White => false,
            Stone::Empty => no_stones_near(pos, n, radius - 1),
            Stone::Out => true,
        })
}

fn amaf_mark(color: Color) -> u8 {
    match color {
        Color::Black => 1,
        Color::White => 2,
    }
}

/// Walk from the root to a leaf along the most urgent children.
///
/// Returns the child indices taken. Moves on the way are written to `amaf`,
/// and a child that reached the expansion threshold is expanded on entry.
fn descend(root: &mut TreeNode, amaf: &mut [u8], params: &SearchParams) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = root;
    let mut passes = 0;

    while !node.children.is_empty() && passes < 2 {
        let i = node.most_urgent(params.rave_equiv);
        path.push(i);
        let child = &mut node.children[i];

        match child.last() {
            Some(mv) if mv.is_pass() => passes += 1,
            Some(mv) => {
                passes = 0;
                let slot = &mut amaf[mv.coord as usize];
                if *slot == 0 {
                    *slot = amaf_mark(mv.color);
                }
            }
            None => {}
        }
        if child.children.is_empty() && child.v >= params.expand_visits {
            expand(child);
        }
        node = child;
    }
    path
}

/// Record one simulation result along `path`.
fn backpropagate(root: &mut TreeNode, path: &[usize], amaf: &[u8], score: f32) {
    let winner = if score > 0.0 { Color::White } else { Color::Black };

    root.v += 1;
    root.w += u32::from(winner != root.to_move);
    root.credit_amaf(amaf, winner);

    let mut node = root;
    for &i in path {
        node = &mut node.children[i];
        node.v += 1;
        node.w += u32::from(node.last().is_some_and(|m| m.color == winner));
        node.credit_amaf(amaf, winner);
    }
}

/// Search from `root` until the budget is spent and return the most visited move.
///
/// Under a simulation budget the search also stops once the best winrate is
/// overwhelming: above 95% after a twentieth of the budget, or above 80%
/// after a fifth.
pub fn tree_search(root: &mut TreeNode, budget: &Budget, params: &SearchParams) -> Coord {
    expand(root);
    let slots = stride(root.pos.size()).pow(2);

    let mut done = 0;
    while !budget.exhausted(done) {
        let mut amaf = vec![0u8; slots];
        let path = descend(root, &mut amaf, params);

        let leaf = path.iter().fold(&*root, |n, &i| &n.children[i]);
        let mut pos = leaf.pos.clone();
        let score = mcplayout(&mut pos, leaf.to_move, Some(&mut amaf));

        backpropagate(root, &path, &amaf, score);
        done += 1;

        if let Some(sims) = budget.sims() {
            let best = root
                .children
                .iter()
                .filter(|c| c.v > 0)
                .map(TreeNode::winrate)
                .fold(0.0, f64::max);
            if (done > sims / 20 && best > FASTPLAY5_THRES)
                || (done > sims / 5 && best > FASTPLAY20_THRES)
            {
                break;
            }
        }
    }
    best_move(root)
}

pub fn best_move(tree: &TreeNode) -> Coord {
    best_child(tree)
        .and_then(TreeNode::last)
        .map_or(PASS, |m| m.coord)
}

/// The most visited child, if the node is expanded.
pub fn best_child(tree: &TreeNode) -> Option<&TreeNode> {
    tree.children.iter().max_by_key(|c| c.v)
}
