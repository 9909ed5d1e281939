use crate::common::TableId;

/// One input to the join, with its standalone scan cost and cardinality.
pub struct JoinTable {
    pub table_id: TableId,
    pub scan_cost: u64,
    pub base_cardinality: u64,
}

/// A predicate's estimated selectivity between two inputs, identified by their index into the
/// `JoinTable` slice passed to `plan_join_order`.
pub struct JoinEdge {
    pub left: usize,
    pub right: usize,
    pub selectivity: f64,
}

/// Left-deep join-order enumeration by subset-size dynamic programming, minimizing
/// `Σ (outer_rows × inner_scan_cost)`. Returns the chosen order as indices into `tables`.
/// Joining two inputs with no connecting predicate falls back to a cartesian product
/// (selectivity 1.0); the DP naturally disfavors it whenever a connected alternative exists,
/// since an unfiltered cartesian inflates `outer_rows` for every later step.
pub fn plan_join_order(tables: &[JoinTable], edges: &[JoinEdge]) -> Vec<usize> {
    let n = tables.len();
    if n == 0 {
        return vec![];
    }
    if n == 1 {
        return vec![0];
    }

    let full = 1usize << n;
    let mut best_cost = vec![u64::MAX; full];
    let mut best_card = vec![0u64; full];
    let mut best_order: Vec<Option<Vec<usize>>> = vec![None; full];

    for (i, table) in tables.iter().enumerate() {
        let mask = 1 << i;
        best_cost[mask] = table.scan_cost;
        best_card[mask] = table.base_cardinality.max(1);
        best_order[mask] = Some(vec![i]);
    }

    let mut masks: Vec<usize> = (1..full).collect();
    masks.sort_by_key(|m| m.count_ones());

    for mask in masks {
        if mask.count_ones() < 2 {
            continue;
        }
        for l in 0..n {
            if mask & (1 << l) == 0 {
                continue;
            }
            let prev_mask = mask & !(1 << l);
            let Some(prev_order) = &best_order[prev_mask] else {
                continue;
            };

            let outer_rows = best_card[prev_mask];
            let cost = best_cost[prev_mask] + outer_rows * tables[l].scan_cost;
            if cost < best_cost[mask] {
                let selectivity = combined_selectivity(edges, l, prev_mask);
                let cardinality = ((best_card[prev_mask] as f64
                    * tables[l].base_cardinality as f64
                    * selectivity)
                    .round() as u64)
                    .max(1);

                let mut order = prev_order.clone();
                order.push(l);

                best_cost[mask] = cost;
                best_card[mask] = cardinality;
                best_order[mask] = Some(order);
            }
        }
    }

    best_order[full - 1].clone().unwrap_or_else(|| (0..n).collect())
}

fn combined_selectivity(edges: &[JoinEdge], candidate: usize, already_joined: usize) -> f64 {
    let mut selectivity = 1.0;
    let mut connected = false;
    for edge in edges {
        let connects = (edge.left == candidate && already_joined & (1 << edge.right) != 0)
            || (edge.right == candidate && already_joined & (1 << edge.left) != 0);
        if connects {
            selectivity *= edge.selectivity;
            connected = true;
        }
    }
    if connected {
        selectivity
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_table_is_trivial() {
        let tables = vec![JoinTable {
            table_id: 1,
            scan_cost: 100,
            base_cardinality: 50,
        }];
        assert_eq!(plan_join_order(&tables, &[]), vec![0]);
    }

    #[test]
    fn prefers_the_smaller_driving_table() {
        let tables = vec![
            JoinTable {
                table_id: 1,
                scan_cost: 1000,
                base_cardinality: 1000,
            },
            JoinTable {
                table_id: 2,
                scan_cost: 10,
                base_cardinality: 10,
            },
        ];
        let edges = vec![JoinEdge {
            left: 0,
            right: 1,
            selectivity: 0.1,
        }];
        let order = plan_join_order(&tables, &edges);
        assert_eq!(order.len(), 2);
        assert_eq!(order[0], 1);
    }
}
