//! 指し手生成器

use smallvec::SmallVec;

use crate::position::{KNIGHT_DELTAS, Position, pawn_forward};
use crate::types::{Color, MAX_MOVES, Move, PieceType, Square};

/// 指し手リスト（1局面分はスタック上に収まる）
pub type MoveList = SmallVec<[Move; MAX_MOVES]>;

/// 生成対象
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenType {
    /// 駒を取らない手を含む全ての疑似合法手
    All,
    /// 駒を取る手のみ
    Captures,
}

const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// 疑似合法手を生成（自玉への王手放置を含む）
pub fn generate_pseudo_legal(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    let us = pos.side_to_move();
    for (from, pt) in pos.pieces(us) {
        match pt {
            PieceType::King => generate_steps(pos, us, from, &ORTHOGONAL, gen_type, list),
            PieceType::Advisor => generate_steps(pos, us, from, &DIAGONAL, gen_type, list),
            PieceType::Bishop => generate_bishop(pos, us, from, gen_type, list),
            PieceType::Knight => generate_knight(pos, us, from, gen_type, list),
            PieceType::Rook => generate_rook(pos, us, from, gen_type, list),
            PieceType::Cannon => generate_cannon(pos, us, from, gen_type, list),
            PieceType::Pawn => generate_pawn(pos, us, from, gen_type, list),
        }
    }
}

/// 合法手を生成
pub fn generate_legal(pos: &mut Position) -> MoveList {
    let mut list = MoveList::new();
    generate_pseudo_legal(pos, GenType::All, &mut list);
    list.retain(|mv| is_legal_pseudo(pos, *mv));
    list
}

/// 疑似合法手が自玉を取られる形にならないか
///
/// 将帥対面は `is_attacked` 内で玉の縦利きとして扱われる。
pub(crate) fn is_legal_pseudo(pos: &mut Position, mv: Move) -> bool {
    let us = pos.side_to_move();
    pos.do_move(mv);
    let ok = !pos.is_king_attacked(us);
    pos.undo_move();
    ok
}

/// 任意の手が現局面で合法か
pub fn is_legal(pos: &Position, mv: Move) -> bool {
    if mv.is_none() {
        return false;
    }
    let mut list = MoveList::new();
    generate_pseudo_legal(pos, GenType::All, &mut list);
    if !list.contains(&mv) {
        return false;
    }
    let mut scratch = pos.clone();
    is_legal_pseudo(&mut scratch, mv)
}

/// 置換表などから得た手が現局面で疑似合法か
pub fn is_pseudo_legal(pos: &Position, mv: Move) -> bool {
    if mv.is_none() {
        return false;
    }
    match pos.piece_on(mv.from()) {
        Some(pc) if pc.color == pos.side_to_move() => {}
        _ => return false,
    }
    let mut list = MoveList::new();
    generate_pseudo_legal(pos, GenType::All, &mut list);
    list.contains(&mv)
}

#[inline]
fn push_if_target(
    pos: &Position,
    us: Color,
    from: Square,
    to: Square,
    gen_type: GenType,
    list: &mut MoveList,
) {
    match pos.piece_on(to) {
        Some(pc) if pc.color == us => {}
        Some(_) => list.push(Move::new(from, to)),
        None if gen_type == GenType::All => list.push(Move::new(from, to)),
        None => {}
    }
}

/// 帥・仕（九宮内の1歩）
fn generate_steps(
    pos: &Position,
    us: Color,
    from: Square,
    deltas: &[(i32, i32)],
    gen_type: GenType,
    list: &mut MoveList,
) {
    for &(df, dr) in deltas {
        if let Some(to) = from.offset(df, dr) {
            if !to.in_palace(us) {
                continue;
            }
            push_if_target(pos, us, from, to, gen_type, list);
        }
    }
}

/// 相（象眼が空いていて河を越えない）
fn generate_bishop(pos: &Position, us: Color, from: Square, gen_type: GenType, list: &mut MoveList) {
    for (df, dr) in DIAGONAL {
        let (Some(eye), Some(to)) = (from.offset(df, dr), from.offset(df * 2, dr * 2)) else {
            continue;
        };
        if pos.piece_on(eye).is_some() || to.crossed_river(us) {
            continue;
        }
        push_if_target(pos, us, from, to, gen_type, list);
    }
}

/// 馬（馬脚が空いている）
fn generate_knight(pos: &Position, us: Color, from: Square, gen_type: GenType, list: &mut MoveList) {
    for (df, dr) in KNIGHT_DELTAS {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        let leg = if df.abs() == 2 {
            from.offset(df / 2, 0)
        } else {
            from.offset(0, dr / 2)
        };
        if leg.is_some_and(|leg| pos.piece_on(leg).is_none()) {
            push_if_target(pos, us, from, to, gen_type, list);
        }
    }
}

/// 車
fn generate_rook(pos: &Position, us: Color, from: Square, gen_type: GenType, list: &mut MoveList) {
    for (df, dr) in ORTHOGONAL {
        let mut cur = from.offset(df, dr);
        while let Some(to) = cur {
            match pos.piece_on(to) {
                Some(pc) => {
                    if pc.color != us {
                        list.push(Move::new(from, to));
                    }
                    break;
                }
                None => {
                    if gen_type == GenType::All {
                        list.push(Move::new(from, to));
                    }
                }
            }
            cur = to.offset(df, dr);
        }
    }
}

/// 炮（移動は車と同じ、駒取りは砲台を1枚越える）
fn generate_cannon(pos: &Position, us: Color, from: Square, gen_type: GenType, list: &mut MoveList) {
    for (df, dr) in ORTHOGONAL {
        let mut cur = from.offset(df, dr);
        let mut screen = false;
        while let Some(to) = cur {
            match pos.piece_on(to) {
                Some(pc) => {
                    if screen {
                        if pc.color != us {
                            list.push(Move::new(from, to));
                        }
                        break;
                    }
                    screen = true;
                }
                None => {
                    if !screen && gen_type == GenType::All {
                        list.push(Move::new(from, to));
                    }
                }
            }
            cur = to.offset(df, dr);
        }
    }
}

/// 兵（河を越えると横にも進める）
fn generate_pawn(pos: &Position, us: Color, from: Square, gen_type: GenType, list: &mut MoveList) {
    if let Some(to) = from.offset(0, pawn_forward(us)) {
        push_if_target(pos, us, from, to, gen_type, list);
    }
    if from.crossed_river(us) {
        for df in [-1, 1] {
            if let Some(to) = from.offset(df, 0) {
                push_if_target(pos, us, from, to, gen_type, list);
            }
        }
    }
}
