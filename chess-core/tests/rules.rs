//! Rule properties checked over randomly played positions.
//!
//! Plays seeded random games from the starting position and, at every ply,
//! verifies the generator and executor against the movement rules:
//! - slider destinations lie on an unobstructed ray
//! - knight destinations are exactly the in-bounds, non-own offsets
//! - double steps only come from the starting rank
//! - applying a move moves the piece and records captures

use chess_core::{
    all_moves, apply, choose_move, legal_destinations, Board, CapturedLedger, Color, MoveKind,
    PieceKind, Square,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const GAMES: u64 = 40;
const MAX_PLIES: usize = 120;

/// Play a random game and hand every intermediate position to `check`.
fn for_each_position(seed: u64, mut check: impl FnMut(&Board, Color)) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut board = Board::starting();
    let mut ledger = CapturedLedger::new();
    let mut side = Color::White;

    for _ in 0..MAX_PLIES {
        check(&board, side);
        if board.king(Color::White).is_none() || board.king(Color::Black).is_none() {
            break;
        }
        // Mix strengths so both capture-heavy and quiet games are covered.
        let level = if seed % 2 == 0 { 1 } else { 5 };
        let Some(mov) = choose_move(&board, side, level, &mut rng) else {
            break;
        };
        apply(&mut board, &mut ledger, mov);
        side = side.opponent();
    }
}

fn step_toward(from: Square, to: Square) -> (i8, i8) {
    let dr = (to.row() as i8 - from.row() as i8).signum();
    let dc = (to.col() as i8 - from.col() as i8).signum();
    (dr, dc)
}

#[test]
fn test_slider_destinations_are_unobstructed_rays() {
    for seed in 0..GAMES {
        for_each_position(seed, |board, _| {
            for (from, piece) in board.pieces() {
                let straight = matches!(piece.kind, PieceKind::Rook | PieceKind::Queen);
                let diagonal = matches!(piece.kind, PieceKind::Bishop | PieceKind::Queen);
                if !straight && !diagonal {
                    continue;
                }
                for mov in legal_destinations(board, from) {
                    let dr = mov.to.row() as i8 - from.row() as i8;
                    let dc = mov.to.col() as i8 - from.col() as i8;
                    let on_line = dr == 0 || dc == 0;
                    let on_diag = dr.abs() == dc.abs();
                    assert!(
                        (straight && on_line) || (diagonal && on_diag),
                        "{:?} {} -> {} is not on a ray",
                        piece.kind,
                        from,
                        mov.to
                    );

                    let (sr, sc) = step_toward(from, mov.to);
                    let mut cursor = from.offset(sr, sc).unwrap();
                    while cursor != mov.to {
                        assert!(board.is_empty(cursor), "{} -> {} jumps {}", from, mov.to, cursor);
                        cursor = cursor.offset(sr, sc).unwrap();
                    }

                    match board.get(mov.to) {
                        Some(target) => {
                            assert_ne!(target.color, piece.color);
                            assert_eq!(mov.kind, MoveKind::Capture);
                        }
                        None => assert_eq!(mov.kind, MoveKind::Quiet),
                    }
                }
            }
        });
    }
}

#[test]
fn test_knight_destinations_match_offsets() {
    const OFFSETS: [(i8, i8); 8] = [
        (-2, -1),
        (-2, 1),
        (-1, -2),
        (-1, 2),
        (1, -2),
        (1, 2),
        (2, -1),
        (2, 1),
    ];

    for seed in 0..GAMES {
        for_each_position(seed, |board, _| {
            for (from, piece) in board.pieces() {
                if piece.kind != PieceKind::Knight {
                    continue;
                }
                let mut expected: Vec<Square> = OFFSETS
                    .iter()
                    .filter_map(|&(dr, dc)| from.offset(dr, dc))
                    .filter(|&to| board.get(to).map_or(true, |p| p.color != piece.color))
                    .collect();
                let mut actual: Vec<Square> =
                    legal_destinations(board, from).into_iter().map(|m| m.to).collect();
                let key = |sq: &Square| (sq.row(), sq.col());
                expected.sort_by_key(key);
                actual.sort_by_key(key);
                assert_eq!(actual, expected, "knight on {}", from);
            }
        });
    }
}

#[test]
fn test_double_step_only_from_starting_rank() {
    for seed in 0..GAMES {
        for_each_position(seed, |board, _| {
            for (from, piece) in board.pieces() {
                for mov in legal_destinations(board, from) {
                    if mov.kind != MoveKind::DoubleStep {
                        continue;
                    }
                    assert_eq!(piece.kind, PieceKind::Pawn);
                    assert_eq!(from.row(), piece.color.pawn_row());
                    assert_eq!(from.col(), mov.to.col());
                    assert_eq!(
                        mov.to.row() as i8 - from.row() as i8,
                        2 * piece.color.forward()
                    );
                }
            }
        });
    }
}

#[test]
fn test_apply_moves_piece_and_records_capture() {
    for seed in 0..GAMES {
        for_each_position(seed, |board, side| {
            for mov in all_moves(board, side) {
                let mut after = *board;
                let mut ledger = CapturedLedger::new();
                let target = board.get(mov.to);
                let applied = apply(&mut after, &mut ledger, mov);

                assert!(after.is_empty(mov.from));
                assert_eq!(after.get(mov.to), Some(mov.piece));
                assert_eq!(applied.mov.captured, target);
                match target {
                    Some(taken) => {
                        assert_eq!(ledger.of(taken.color), &[taken]);
                        assert!(ledger.of(taken.color.opponent()).is_empty());
                        assert!(applied.notation.contains('x'));
                    }
                    None => {
                        assert!(ledger.is_empty());
                        assert!(!applied.notation.contains('x'));
                    }
                }
                assert_eq!(after.pieces().count(), board.pieces().count() - target.iter().count());
            }
        });
    }
}

#[test]
fn test_opening_e2_e5_is_unreachable() {
    let board = Board::starting();
    let e2 = Square::from_algebraic("e2").unwrap();
    let e5 = Square::from_algebraic("e5").unwrap();
    assert!(legal_destinations(&board, e2).iter().all(|m| m.to != e5));
}
