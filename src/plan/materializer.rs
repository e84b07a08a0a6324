use futures::future::join_all;
use itertools::Itertools;
use tracing::{debug, info};

use crate::api::{fetch_route_geometry, RoadRouter};
use crate::config::DispatchConfig;
use crate::decay::remaining_activity;
use crate::domain::hospital::Hospital;
use crate::domain::plan::{
    Analytics, CanceledMission, ClinicalOutcomes, FleetFinancial, PlanPayload, Stop, Triage,
    VehicleFinancial, VehiclePlan,
};
use crate::geo::LatLon;
use crate::solver::{FleetSolution, VehicleRoute};

const OPTIMAL_THRESHOLD: f64 = 70.0;
const DOSE_SAVED_THRESHOLD: f64 = 60.0;

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Turns the solver output into the caller-facing plan: arrival potency
/// per stop, futile deliveries canceled, road geometry for the viable
/// path, and the financial / clinical rollups.
pub async fn materialize<R: RoadRouter>(
    solution: &FleetSolution,
    hospitals: &[Hospital],
    router: &R,
    avoid: Option<LatLon>,
    snapped_road: &str,
    config: &DispatchConfig,
) -> PlanPayload {
    let mut routes = Vec::with_capacity(solution.routes.len());
    let mut fleet_total_potency = 0.0;
    let mut fleet_served = 0usize;
    let mut all_canceled: Vec<Stop> = Vec::new();

    for (vehicle_id, route) in solution.routes.iter().enumerate() {
        let all_steps = schedule_steps(route, hospitals, config);

        // Split futile deliveries out of the driving plan, keeping their
        // original ETA for the cancellation report.
        let mut viable = Vec::new();
        let mut canceled = Vec::new();
        for mut step in all_steps {
            if !step.is_depot() && step.potency < config.futility_threshold {
                step.triage = Triage::Canceled;
                all_canceled.push(step.clone());
                canceled.push(step);
            } else {
                if !step.is_depot() {
                    fleet_total_potency += step.potency;
                    fleet_served += 1;
                }
                viable.push(step);
            }
        }

        let geometry = assemble_viable_geometry(&viable, router, avoid).await;

        let stops: Vec<&Stop> = viable.iter().filter(|s| !s.is_depot()).collect();
        let preserved: f64 = stops
            .iter()
            .map(|s| (s.potency / 100.0) * config.dose_value)
            .sum();
        let degraded_waste: f64 = stops
            .iter()
            .map(|s| ((100.0 - s.potency) / 100.0) * config.dose_value)
            .sum();
        let waste = degraded_waste + canceled.len() as f64 * config.dose_value;
        let mission = (stops.len() + canceled.len()) as f64 * config.dose_value;
        let avg_potency = if stops.is_empty() {
            0.0
        } else {
            stops.iter().map(|s| s.potency).sum::<f64>() / stops.len() as f64
        };

        routes.push(VehiclePlan {
            vehicle_id,
            steps: viable,
            canceled,
            geometry,
            avg_potency: round1(avg_potency),
            financial: VehicleFinancial {
                mission_value: mission.round(),
                preserved_value: preserved.round(),
                waste_value: waste.round(),
            },
        });
    }

    let fleet_avg = if fleet_served > 0 {
        fleet_total_potency / fleet_served as f64
    } else {
        0.0
    };
    let doses_saved = routes
        .iter()
        .flat_map(|r| r.steps.iter())
        .filter(|s| !s.is_depot() && s.potency >= DOSE_SAVED_THRESHOLD)
        .count();
    let cardiac_ready = routes
        .iter()
        .flat_map(|r| r.steps.iter())
        .filter(|s| !s.is_depot() && s.potency >= OPTIMAL_THRESHOLD)
        .count();

    let total_mission = (fleet_served + all_canceled.len()) as f64 * config.dose_value;
    let total_preserved: f64 = routes.iter().map(|r| r.financial.preserved_value).sum();
    let total_waste: f64 = routes.iter().map(|r| r.financial.waste_value).sum();

    info!(
        served = fleet_served,
        canceled = all_canceled.len(),
        avg_potency = round1(fleet_avg),
        cardiac_ready,
        "plan materialized"
    );

    PlanPayload {
        routes,
        analytics: Analytics {
            fleet_avg_potency: round1(fleet_avg),
            fleet_total_potency: round1(fleet_total_potency),
            fleet_stops_served: fleet_served,
            incident_active: avoid.is_some(),
            snapped_road: snapped_road.to_string(),
            clinical_outcomes: ClinicalOutcomes {
                doses_saved,
                cardiac_ready,
                avoided_waste_count: all_canceled.len(),
                avoided_waste_cost: all_canceled.len() as f64 * config.dose_value,
                canceled_missions: all_canceled
                    .iter()
                    .map(|c| CanceledMission {
                        name: c.name.clone(),
                        potency: c.potency,
                        tier: c.tier,
                        original_eta_min: c.arrival_time_min,
                    })
                    .collect(),
            },
            financial: FleetFinancial {
                dose_value: config.dose_value,
                total_mission_value: total_mission.round(),
                total_preserved_value: total_preserved.round(),
                total_waste_value: total_waste.round(),
            },
        },
    }
}

/// Full per-vehicle schedule as the solver produced it, depot bookends
/// included, with the decayed potency at each arrival.
fn schedule_steps(route: &VehicleRoute, hospitals: &[Hospital], config: &DispatchConfig) -> Vec<Stop> {
    let depot = &hospitals[0];
    let mut steps = Vec::with_capacity(route.stops.len() + 2);
    steps.push(depot_stop(depot, 0, config));

    for (&node, &arrival) in route.stops.iter().zip(&route.arrival_min) {
        let h = &hospitals[node];
        let potency = round1(remaining_activity(
            config.initial_activity,
            arrival as f64 / 60.0,
            config.half_life_hours,
        ));
        let triage = if potency >= OPTIMAL_THRESHOLD {
            Triage::Optimal
        } else {
            Triage::Degraded
        };
        steps.push(Stop {
            name: h.name.clone(),
            tier: u8::from(h.tier),
            arrival_time_min: arrival,
            lat: h.lat,
            lon: h.lon,
            potency,
            triage,
        });
    }

    steps.push(depot_stop(depot, route.return_min, config));
    steps
}

fn depot_stop(depot: &Hospital, arrival_min: i64, config: &DispatchConfig) -> Stop {
    Stop {
        name: depot.name.clone(),
        tier: u8::from(depot.tier),
        arrival_time_min: arrival_min,
        lat: depot.lat,
        lon: depot.lon,
        potency: config.initial_activity,
        triage: Triage::Depot,
    }
}

/// Road geometry of the viable path only: one routed segment per
/// consecutive stop pair, honouring the active avoid point, joined with
/// the shared junction point deduplicated.
async fn assemble_viable_geometry<R: RoadRouter>(
    viable: &[Stop],
    router: &R,
    avoid: Option<LatLon>,
) -> Vec<(f64, f64)> {
    if !viable.iter().any(|s| !s.is_depot()) {
        return Vec::new();
    }

    let segments = join_all(viable.iter().tuple_windows().map(|(from, to)| {
        fetch_route_geometry(
            router,
            LatLon::new(from.lat, from.lon),
            LatLon::new(to.lat, to.lon),
            avoid,
        )
    }))
    .await;

    let mut geometry: Vec<(f64, f64)> = Vec::new();
    for mut points in segments {
        if let (Some(last), Some(first)) = (geometry.last(), points.first()) {
            if last == first {
                points.remove(0);
            }
        }
        geometry.extend(points);
    }
    debug!(points = geometry.len(), "viable path geometry assembled");
    geometry
}
