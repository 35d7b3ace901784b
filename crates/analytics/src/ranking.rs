use core_types::Position;

/// The top `n` positions by unrealized PNL, best first. Ties break by
/// symbol lexical order so repeated runs rank identically. `n` larger than
/// the record count returns everything, no padding.
pub fn top_winners(positions: &[Position], n: usize) -> Vec<Position> {
    let mut ranked = positions.to_vec();
    ranked.sort_by(|a, b| {
        b.unrealized_pnl
            .cmp(&a.unrealized_pnl)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    ranked.truncate(n);
    ranked
}

/// The bottom `n` positions by unrealized PNL, worst first. Same tie-break
/// and capping rules as [`top_winners`].
pub fn top_losers(positions: &[Position], n: usize) -> Vec<Position> {
    let mut ranked = positions.to_vec();
    ranked.sort_by(|a, b| {
        a.unrealized_pnl
            .cmp(&b.unrealized_pnl)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    ranked.truncate(n);
    ranked
}
