use super::model::RoutingProblem;
use crate::evaluation::route_arrivals;

/// One vehicle's solved schedule: customer nodes in visit order with the
/// cumulative arrival minute at each, and the minute the vehicle is back
/// at the depot.
#[derive(Debug, Clone)]
pub struct VehicleRoute {
    pub stops: Vec<usize>,
    pub arrival_min: Vec<i64>,
    pub return_min: i64,
}

/// Solver output for the whole fleet. `dropped` holds customers the
/// search elected not to serve (at drop-penalty price).
#[derive(Debug, Clone)]
pub struct FleetSolution {
    pub routes: Vec<VehicleRoute>,
    pub dropped: Vec<usize>,
    pub objective: i64,
}

impl FleetSolution {
    pub fn from_assignment(
        problem: &RoutingProblem,
        assignment: Vec<Vec<usize>>,
        objective: i64,
    ) -> Self {
        let mut served = vec![false; problem.num_nodes()];
        let routes = assignment
            .into_iter()
            .map(|stops| {
                let (arrival_min, return_min) = route_arrivals(problem, &stops);
                for &node in &stops {
                    served[node] = true;
                }
                VehicleRoute {
                    stops,
                    arrival_min,
                    return_min,
                }
            })
            .collect();
        let dropped = problem.customers().filter(|&c| !served[c]).collect();
        Self {
            routes,
            dropped,
            objective,
        }
    }

    pub fn served_count(&self) -> usize {
        self.routes.iter().map(|r| r.stops.len()).sum()
    }
}
