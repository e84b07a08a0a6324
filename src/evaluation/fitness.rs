use super::cost::{arc_cost, route_arrivals};
use crate::solver::model::RoutingProblem;

/// Full objective for a fleet assignment: arc costs plus soft-bound
/// violations plus drop penalties for unserved customers. Returns `None`
/// when a hard constraint is violated (overloaded vehicle, arrival past
/// the per-node cap, route past the horizon).
pub fn objective(problem: &RoutingProblem, routes: &[Vec<usize>]) -> Option<i64> {
    let mut cost = 0i64;
    let mut served = vec![false; problem.num_nodes()];

    for route in routes {
        let load: u64 = route.iter().map(|&n| problem.demands[n]).sum();
        if load > problem.vehicle_capacity {
            return None;
        }

        let (arrivals, return_min) = route_arrivals(problem, route);
        if return_min > problem.horizon_min {
            return None;
        }

        let mut prev = 0usize;
        for (&node, &arrival) in route.iter().zip(&arrivals) {
            if arrival > problem.node_time_cap_min {
                return None;
            }
            cost += arc_cost(problem, prev, node);
            cost += problem.penalties.soft_bound_cost(problem.tiers[node], arrival);
            served[node] = true;
            prev = node;
        }
        if !route.is_empty() {
            cost += arc_cost(problem, prev, 0);
        }
    }

    for customer in problem.customers() {
        if !served[customer] {
            cost += problem.penalties.drop_penalty(problem.tiers[customer]);
        }
    }

    Some(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use crate::domain::hospital::{Hospital, Tier};

    fn problem(matrix: Vec<Vec<f64>>, tiers: &[Tier], vehicles: usize) -> RoutingProblem {
        let hospitals: Vec<Hospital> = tiers
            .iter()
            .enumerate()
            .map(|(i, &tier)| Hospital {
                name: format!("H{i}"),
                lat: 0.0,
                lon: 0.0,
                tier,
                kind: String::new(),
            })
            .collect();
        RoutingProblem::new(&hospitals, matrix, vehicles, 10, &DispatchConfig::default())
    }

    #[test]
    fn serving_everything_beats_dropping() {
        let p = problem(
            vec![
                vec![0.0, 10.0, 50.0],
                vec![10.0, 0.0, 40.0],
                vec![50.0, 40.0, 0.0],
            ],
            &[Tier::Source, Tier::Metro, Tier::Remote],
            1,
        );
        let all = objective(&p, &[vec![1, 2]]).unwrap();
        let none = objective(&p, &[vec![]]).unwrap();
        assert!(all < none);
        // Dropping both: 50_000 + 1_000_000.
        assert_eq!(none, 1_050_000);
    }

    #[test]
    fn arrival_past_hard_cap_is_infeasible() {
        let p = problem(
            vec![vec![0.0, 2000.0], vec![2000.0, 0.0]],
            &[Tier::Source, Tier::Metro],
            1,
        );
        assert!(objective(&p, &[vec![1]]).is_none());
        // Leaving the node unserved is feasible at drop-penalty price.
        assert_eq!(objective(&p, &[vec![]]), Some(50_000));
    }

    #[test]
    fn overloaded_vehicle_is_infeasible() {
        let n = 13;
        let matrix = vec![vec![1.0; n]; n];
        let tiers: Vec<Tier> = std::iter::once(Tier::Source)
            .chain(std::iter::repeat(Tier::Metro).take(n - 1))
            .collect();
        let p = problem(matrix, &tiers, 1);
        let all: Vec<usize> = (1..n).collect();
        assert!(objective(&p, &[all]).is_none());
        let ten: Vec<usize> = (1..11).collect();
        assert!(objective(&p, &[ten]).is_some());
    }

    #[test]
    fn late_arrivals_pay_soft_bound_fees() {
        // One remote customer 130 minutes out: 10 minutes past the
        // 120-minute bound at 500/min.
        let p = problem(
            vec![vec![0.0, 130.0], vec![130.0, 0.0]],
            &[Tier::Source, Tier::Remote],
            1,
        );
        let served = objective(&p, &[vec![1]]).unwrap();
        let arc_out = (130.0f64 * 100.0) as i64;
        let arc_back = (130.0f64 * 100.0) as i64;
        assert_eq!(served, arc_out + arc_back + 10 * 500);
    }
}
