use super::model::RoutingProblem;
use crate::evaluation::arc_cost;

/// Cheapest-arc path construction: each vehicle in turn extends its route
/// with the cheapest feasible arc out of its current end until nothing
/// fits. Customers no vehicle can reach in time stay unassigned.
pub fn cheapest_arc_construction(problem: &RoutingProblem) -> Vec<Vec<usize>> {
    let mut unserved: Vec<usize> = problem.customers().collect();
    let mut routes: Vec<Vec<usize>> = vec![Vec::new(); problem.num_vehicles];

    for route in routes.iter_mut() {
        let mut current = 0usize;
        let mut elapsed = 0i64;
        let mut load = 0u64;

        loop {
            let next = unserved
                .iter()
                .copied()
                .filter(|&j| load + problem.demands[j] <= problem.vehicle_capacity)
                .filter(|&j| {
                    let arrival = elapsed + problem.transit_min(current, j);
                    arrival <= problem.node_time_cap_min
                        && arrival + problem.transit_min(j, 0) <= problem.horizon_min
                })
                .min_by_key(|&j| (arc_cost(problem, current, j), j));

            let Some(j) = next else { break };
            elapsed += problem.transit_min(current, j);
            load += problem.demands[j];
            route.push(j);
            unserved.retain(|&u| u != j);
            current = j;
        }
    }

    routes
}
