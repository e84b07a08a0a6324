use serde::Serialize;
use tracing::{info, warn};

use crate::api::RoadRouter;
use crate::config::{DispatchConfig, ScenarioConfig};
use crate::decay::remaining_activity;
use crate::distance::build_time_matrix;
use crate::domain::hospital::{validate_hospitals, Hospital, Tier};
use crate::domain::plan::{PlanPayload, Stop, VehiclePlan};
use crate::error::DispatchError;
use crate::geo;
use crate::optimizer::Optimizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RerouteDecision {
    /// The spiked hospital left the viable list; the van is retasked.
    AbandonReroute,
    /// The re-plan absorbs the spike and still visits the hospital.
    Persist,
}

/// Outcome of one black-swan run: the baseline plan, the single-vehicle
/// re-plan, the ignorant-arrival projection and the narrative log.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub baseline: PlanPayload,
    pub rerouted: PlanPayload,
    pub target_vehicle: usize,
    pub target_name: String,
    pub target_tier: u8,
    pub ignorant_arrival_min: f64,
    pub ignorant_activity: f64,
    pub decision: RerouteDecision,
    pub narrative: String,
    /// (minute, activity %) samples of the decay curve out to one hour
    /// past the ignorant arrival.
    pub decay_curve: Vec<(f64, f64)>,
}

/// Replays a mid-route road closure against a running fleet and compares
/// pushing through the spike with re-planning around it.
pub struct DynamicSimulator<'r, R: RoadRouter> {
    hospitals: Vec<Hospital>,
    router: &'r R,
    config: DispatchConfig,
    scenario: ScenarioConfig,
}

impl<'r, R: RoadRouter> DynamicSimulator<'r, R> {
    pub fn new(
        hospitals: Vec<Hospital>,
        router: &'r R,
        config: DispatchConfig,
        scenario: ScenarioConfig,
    ) -> Result<DynamicSimulator<'r, R>, DispatchError> {
        validate_hospitals(&hospitals)?;
        Ok(DynamicSimulator {
            hospitals,
            router,
            config,
            scenario,
        })
    }

    pub async fn run_scenario(&self) -> Result<SimulationReport, DispatchError> {
        info!("initializing black-swan scenario");

        let baseline = Optimizer::new(
            self.hospitals.clone(),
            self.router,
            None,
            self.config.clone(),
        )
        .await?
        .solve_and_report(None)
        .await?;

        let (target_vehicle, target_route) = self.pick_target_route(&baseline)?;
        info!(
            vehicle = target_vehicle,
            "simulating closure at T={} min", self.scenario.disruption_time_min
        );

        let (van_position, next_idx) = self.locate_van(target_route)?;
        let next_stop = &target_route.steps[next_idx];
        let next_hospital = self.hospital_by_name(&next_stop.name)?;
        warn!(
            ahead = %next_hospital.name,
            "closure detected ahead of the target vehicle"
        );

        // Mobile depot at the interpolated position plus everything the
        // van still had on its schedule, the spiked stop included.
        let mut reduced = vec![Hospital {
            name: format!("Van_EnRoute_{}", next_hospital.name),
            lat: van_position.lat,
            lon: van_position.lon,
            tier: Tier::Source,
            kind: "Mobile".to_string(),
        }];
        for step in &target_route.steps[next_idx..] {
            if step.is_depot() {
                continue;
            }
            reduced.push(self.hospital_by_name(&step.name)?.clone());
        }

        let mut matrix = build_time_matrix(&reduced, None, &self.config).await;
        let base_time = matrix[0][1];
        let spiked_time = base_time * self.scenario.spike_factor;

        // Option A: push through the spike and absorb the delay.
        let ignorant_arrival_min = self.scenario.disruption_time_min + spiked_time;
        let ignorant_activity = remaining_activity(
            self.config.initial_activity,
            ignorant_arrival_min / 60.0,
            self.config.half_life_hours,
        );
        info!(
            arrival_min = ignorant_arrival_min,
            activity = ignorant_activity,
            "ignorant projection computed"
        );

        // Option B: re-plan the remaining stops around the spike.
        matrix[0][1] = spiked_time;
        let mut reroute_optimizer =
            Optimizer::with_matrix(reduced.clone(), matrix, self.router, self.config.clone())?;
        reroute_optimizer.set_fleet(1, self.config.vehicle_capacity);
        let rerouted = reroute_optimizer.solve_and_report(None).await?;

        let replanned: Vec<&Stop> = rerouted.routes[0]
            .steps
            .iter()
            .filter(|s| !s.is_depot())
            .collect();
        let decision = if replanned.iter().any(|s| s.name == next_hospital.name) {
            RerouteDecision::Persist
        } else {
            RerouteDecision::AbandonReroute
        };
        info!(?decision, "re-plan evaluated");

        let decay_curve = sample_decay_curve(&self.config, ignorant_arrival_min);
        let narrative = self.narrative(
            next_hospital,
            ignorant_arrival_min,
            ignorant_activity,
            &replanned,
            decision,
        );

        Ok(SimulationReport {
            baseline,
            rerouted,
            target_vehicle,
            target_name: next_hospital.name.clone(),
            target_tier: u8::from(next_hospital.tier),
            ignorant_arrival_min,
            ignorant_activity,
            decision,
            narrative,
            decay_curve,
        })
    }

    /// First route whose first delivery matches the configured metro
    /// name, falling back to the first route opening with a tier-1 stop.
    fn pick_target_route<'p>(
        &self,
        baseline: &'p PlanPayload,
    ) -> Result<(usize, &'p VehiclePlan), DispatchError> {
        let first_delivery = |route: &'p VehiclePlan| route.steps.iter().find(|s| !s.is_depot());

        for route in &baseline.routes {
            if let Some(first) = first_delivery(route) {
                if first.name.contains(&self.scenario.target_stop) {
                    return Ok((route.vehicle_id, route));
                }
            }
        }
        info!(
            "no route opens with '{}', falling back to the first metro route",
            self.scenario.target_stop
        );
        for route in &baseline.routes {
            if let Some(first) = first_delivery(route) {
                if first.tier == 1 {
                    return Ok((route.vehicle_id, route));
                }
            }
        }
        Err(DispatchError::NoTargetRoute)
    }

    /// Interpolates the van's position at the disruption time and returns
    /// it with the index (into `steps`) of the stop it is driving toward.
    fn locate_van(&self, route: &VehiclePlan) -> Result<(geo::LatLon, usize), DispatchError> {
        let t = self.scenario.disruption_time_min;
        let steps = &route.steps;

        // steps[0] is the depot departure at minute zero.
        for idx in 1..steps.len() {
            let arrival = steps[idx].arrival_time_min as f64;
            if t < arrival {
                let prev = &steps[idx - 1];
                let leg = arrival - prev.arrival_time_min as f64;
                let elapsed = t - prev.arrival_time_min as f64;
                let fraction = if leg > 0.0 { elapsed / leg } else { 0.0 };
                let position = geo::interpolate(
                    geo::LatLon::new(prev.lat, prev.lon),
                    geo::LatLon::new(steps[idx].lat, steps[idx].lon),
                    fraction,
                );
                if steps[idx].is_depot() {
                    // Already heading home; nothing left to disrupt.
                    return Err(DispatchError::NoTargetRoute);
                }
                return Ok((position, idx));
            }
        }
        warn!("route finished before the disruption time");
        Err(DispatchError::NoTargetRoute)
    }

    fn hospital_by_name(&self, name: &str) -> Result<&Hospital, DispatchError> {
        self.hospitals
            .iter()
            .find(|h| h.name == name)
            .ok_or(DispatchError::NoTargetRoute)
    }

    fn narrative(
        &self,
        target: &Hospital,
        ignorant_arrival_min: f64,
        ignorant_activity: f64,
        replanned: &[&Stop],
        decision: RerouteDecision,
    ) -> String {
        let viable = ignorant_activity > self.config.futility_threshold;
        let route_names: Vec<&str> = replanned.iter().map(|s| s.name.as_str()).collect();
        format!(
            "# Simulation Log: Black Swan Event\n\n\
             ## Scenario\n\
             *   **Event**: Road closure (traffic spike) at T={t:.0} min.\n\
             *   **Target**: {name} (Tier {tier}).\n\
             *   **Futility Threshold**: {threshold}% Activity.\n\n\
             ## Comparison\n\n\
             ### Option A: Ignorant System (Push Through)\n\
             *   **Arrival Time**: T={arrival:.1} min\n\
             *   **Activity**: {activity:.2} units\n\
             *   **Viable?**: {viable}\n\n\
             ### Option B: Intelligent System (Reroute)\n\
             *   **Decision**: {decision}\n\
             *   **New Route**: {route:?}\n",
            t = self.scenario.disruption_time_min,
            name = target.name,
            tier = u8::from(target.tier),
            threshold = self.config.futility_threshold,
            arrival = ignorant_arrival_min,
            activity = ignorant_activity,
            viable = if viable { "YES" } else { "NO (FUTILE)" },
            decision = match decision {
                RerouteDecision::AbandonReroute => "ABANDON & REROUTE",
                RerouteDecision::Persist => "PERSIST",
            },
            route = route_names,
        )
    }
}

/// 100 evenly spaced (minute, activity %) samples from departure to one
/// hour past the ignorant arrival.
fn sample_decay_curve(config: &DispatchConfig, ignorant_arrival_min: f64) -> Vec<(f64, f64)> {
    let end = ignorant_arrival_min + 60.0;
    (0..100)
        .map(|i| {
            let t = end * i as f64 / 99.0;
            let activity =
                remaining_activity(config.initial_activity, t / 60.0, config.half_life_hours);
            (t, activity)
        })
        .collect()
}
