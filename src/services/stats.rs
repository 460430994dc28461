// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Year-in-review aggregation.
//!
//! A pure function of the activity collection (and today's date, for the
//! current streak). Empty input produces a zeroed result, never an error.

use chrono::{Datelike, Local, NaiveDate};
use std::collections::{BTreeSet, HashMap};

use crate::models::stats::{
    empty_monthly_distribution, Averages, LocationStats, PersonalBests, RouteData, Streaks,
    MONTHS,
};
use crate::models::{Activity, WrappedStats};

/// Sports eligible for "fastest activity".
const SPEED_SPORTS: &[&str] = &["Run", "Ride", "VirtualRide", "VirtualRun"];

/// Number of routes kept for the route map.
pub const TOP_ROUTES: usize = 10;

/// Number of locations kept for the locations slide.
pub const TOP_LOCATIONS: usize = 5;

/// Aggregate activities, measuring the current streak against the local date.
pub fn process_activities_now(activities: &[Activity]) -> WrappedStats {
    process_activities(activities, Local::now().date_naive())
}

/// Aggregate activities into summary statistics.
pub fn process_activities(activities: &[Activity], today: NaiveDate) -> WrappedStats {
    let Some(first) = activities.first() else {
        return WrappedStats::default();
    };

    let total_distance = activities.iter().map(|a| a.distance).sum::<f64>() / 1000.0;
    let total_time = activities.iter().map(|a| a.moving_time).sum::<f64>() / 3600.0;
    let total_elevation = activities.iter().map(|a| a.total_elevation_gain).sum::<f64>();
    let total_kudos = activities.iter().map(|a| a.kudos_count).sum::<u32>();
    let count = activities.len();

    let mut activity_types: HashMap<String, u32> = HashMap::new();
    for activity in activities {
        *activity_types
            .entry(activity.sport().to_string())
            .or_insert(0) += 1;
    }

    let longest_activity = activities.iter().fold(first, |longest, current| {
        if current.distance > longest.distance {
            current
        } else {
            longest
        }
    });

    WrappedStats {
        total_distance,
        total_time,
        total_elevation,
        total_activities: count as u32,
        total_kudos,
        longest_activity: Some(longest_activity.clone()),
        fastest_activity: fastest_activity(activities).cloned(),
        personal_bests: personal_bests(activities),
        activity_types,
        monthly_distribution: monthly_distribution(activities),
        average_per_activity: Averages {
            distance: total_distance / count as f64,
            time: total_time / count as f64,
            elevation: total_elevation / count as f64,
        },
        streaks: calculate_streaks(activities, today),
        top_locations: top_locations(activities),
        top_routes: top_routes(activities),
        all_polylines: activities
            .iter()
            .filter_map(|a| a.polyline().map(str::to_string))
            .collect(),
    }
}

/// Count activities per calendar month of their local start time.
///
/// All twelve months are present even when zero. Activities with an
/// unparseable local timestamp are not counted.
pub fn monthly_distribution(activities: &[Activity]) -> HashMap<String, u32> {
    let mut distribution = empty_monthly_distribution();
    for activity in activities {
        let Some(start) = activity.local_start() else {
            tracing::debug!(id = activity.id, "Activity has no usable local date");
            continue;
        };
        let label = MONTHS[start.month0() as usize];
        if let Some(count) = distribution.get_mut(label) {
            *count += 1;
        }
    }
    distribution
}

/// Fastest run or ride by average speed; ties keep the first seen.
pub fn fastest_activity(activities: &[Activity]) -> Option<&Activity> {
    activities
        .iter()
        .filter(|a| SPEED_SPORTS.contains(&a.sport()))
        .fold(None, |fastest: Option<&Activity>, current| match fastest {
            Some(f) if current.average_speed <= f.average_speed => Some(f),
            _ => Some(current),
        })
}

fn personal_bests(activities: &[Activity]) -> PersonalBests {
    let mut bests = activities
        .iter()
        .fold(PersonalBests::default(), |mut bests, a| {
            bests.longest_distance = bests.longest_distance.max(a.distance);
            bests.longest_time = bests.longest_time.max(a.moving_time);
            bests.highest_elevation = bests.highest_elevation.max(a.total_elevation_gain);
            bests.most_kudos = bests.most_kudos.max(a.kudos_count);
            bests
        });
    bests.longest_distance /= 1000.0;
    bests.longest_time /= 3600.0;
    bests
}

/// Longest and current runs of consecutive active days.
///
/// Days come from the local start time. The current streak is the run
/// ending on the most recent active day on or before `today`, and only
/// counts if that day is today or yesterday.
pub fn calculate_streaks(activities: &[Activity], today: NaiveDate) -> Streaks {
    let dates: BTreeSet<NaiveDate> = activities
        .iter()
        .filter_map(|a| a.local_start())
        .map(|start| start.date())
        .collect();

    let mut longest_streak = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    // Length of the run ending at the latest date not after today.
    let mut run_at_today: Option<(NaiveDate, u32)> = None;

    for &date in &dates {
        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest_streak = longest_streak.max(run);
        if date <= today {
            run_at_today = Some((date, run));
        }
        previous = Some(date);
    }

    let current_streak = match run_at_today {
        Some((last, run)) if (today - last).num_days() <= 1 => run,
        _ => 0,
    };

    Streaks {
        longest_streak,
        current_streak,
    }
}

/// Activities with an encoded route, longest first.
pub fn top_routes(activities: &[Activity]) -> Vec<RouteData> {
    let mut with_routes: Vec<&Activity> = activities
        .iter()
        .filter(|a| a.polyline().is_some())
        .collect();
    with_routes.sort_by(|a, b| b.distance.total_cmp(&a.distance));

    with_routes
        .into_iter()
        .take(TOP_ROUTES)
        .filter_map(|a| {
            Some(RouteData {
                polyline: a.polyline()?.to_string(),
                name: a.name.clone(),
                distance: a.distance / 1000.0,
                activity_type: a.sport().to_string(),
            })
        })
        .collect()
}

/// Group activities by city, or by rounded start coordinates when no city
/// is known, and return the most frequent places.
pub fn top_locations(activities: &[Activity]) -> Vec<LocationStats> {
    let mut locations: Vec<LocationStats> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for activity in activities {
        let start = activity.start_latlng.filter(|[lat, lng]| {
            lat.is_finite() && lng.is_finite() && *lat != 0.0 && *lng != 0.0
        });

        let (key, seed) = if activity.location_city.is_some() || activity.location_country.is_some()
        {
            let city = activity
                .location_city
                .clone()
                .unwrap_or_else(|| "Unknown".to_string());
            let country = activity.location_country.clone().unwrap_or_default();
            let [lat, lng] = start.unwrap_or([0.0, 0.0]);
            (
                format!("city-{}-{}", city, country),
                LocationStats {
                    city,
                    country,
                    count: 0,
                    total_distance: 0.0,
                    lat,
                    lng,
                },
            )
        } else if let Some([lat, lng]) = start {
            let lat_r = (lat * 100.0).round() / 100.0;
            let lng_r = (lng * 100.0).round() / 100.0;
            (
                format!("coords-{}-{}", lat_r, lng_r),
                LocationStats {
                    city: format!("{:.2}°, {:.2}°", lat_r, lng_r),
                    country: String::new(),
                    count: 0,
                    total_distance: 0.0,
                    lat,
                    lng,
                },
            )
        } else {
            continue;
        };

        let slot = *index.entry(key).or_insert_with(|| {
            locations.push(seed);
            locations.len() - 1
        });
        let location = &mut locations[slot];
        location.count += 1;
        location.total_distance += activity.distance / 1000.0;
    }

    locations.sort_by(|a, b| b.count.cmp(&a.count));
    locations.truncate(TOP_LOCATIONS);
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityMap;

    fn make_activity(id: u64, sport: &str, date: &str, distance: f64) -> Activity {
        Activity {
            id,
            name: format!("Test Activity {}", id),
            distance,
            moving_time: 3600.0,
            elapsed_time: 3700.0,
            total_elevation_gain: 100.0,
            activity_type: sport.to_string(),
            sport_type: sport.to_string(),
            start_date: format!("{}T08:00:00Z", date),
            start_date_local: format!("{}T08:00:00Z", date),
            timezone: None,
            kudos_count: 1,
            achievement_count: 0,
            average_speed: 3.0,
            max_speed: 5.0,
            average_heartrate: None,
            max_heartrate: None,
            start_latlng: None,
            end_latlng: None,
            location_city: None,
            location_state: None,
            location_country: None,
            map: None,
        }
    }

    fn with_route(mut activity: Activity) -> Activity {
        activity.map = ActivityMap::from_coords(activity.id, &[[37.0, -122.0], [37.1, -122.1]]);
        activity
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_input() {
        let stats = process_activities(&[], day("2024-01-01"));
        assert_eq!(stats.total_distance, 0.0);
        assert_eq!(stats.total_activities, 0);
        assert_eq!(stats.total_kudos, 0);
        assert!(stats.longest_activity.is_none());
        assert!(stats.fastest_activity.is_none());
        assert!(stats.activity_types.is_empty());
        assert!(stats.top_routes.is_empty());
        assert_eq!(stats.monthly_distribution.len(), 12);
        assert!(stats.monthly_distribution.values().all(|&c| c == 0));
        assert_eq!(stats.streaks, Streaks::default());
    }

    #[test]
    fn test_totals_and_units() {
        let activities = vec![
            make_activity(1, "Run", "2024-01-01", 5000.0),
            make_activity(2, "Ride", "2024-01-02", 20000.0),
        ];
        let stats = process_activities(&activities, day("2024-06-01"));

        assert_eq!(stats.total_distance, 25.0);
        assert_eq!(stats.total_time, 2.0);
        assert_eq!(stats.total_elevation, 200.0);
        assert_eq!(stats.total_kudos, 2);
        assert_eq!(stats.total_activities, 2);
        assert_eq!(stats.average_per_activity.distance, 12.5);
        assert_eq!(stats.average_per_activity.time, 1.0);
        assert_eq!(stats.personal_bests.longest_distance, 20.0);
        assert_eq!(stats.personal_bests.longest_time, 1.0);
    }

    #[test]
    fn test_activity_types() {
        let mut legacy = make_activity(3, "Swim", "2024-01-03", 1000.0);
        legacy.sport_type = String::new();
        let activities = vec![
            make_activity(1, "Run", "2024-01-01", 5000.0),
            make_activity(2, "Run", "2024-01-02", 5000.0),
            legacy,
        ];
        let stats = process_activities(&activities, day("2024-06-01"));
        assert_eq!(stats.activity_types.get("Run"), Some(&2));
        assert_eq!(stats.activity_types.get("Swim"), Some(&1));
    }

    #[test]
    fn test_monthly_distribution_sums_to_count() {
        let activities = vec![
            make_activity(1, "Run", "2024-01-15", 1.0),
            make_activity(2, "Run", "2024-01-20", 1.0),
            make_activity(3, "Run", "2024-03-01", 1.0),
            make_activity(4, "Run", "2024-12-31", 1.0),
        ];
        let stats = process_activities(&activities, day("2025-01-01"));

        assert_eq!(stats.monthly_distribution.len(), 12);
        assert_eq!(stats.monthly_distribution["Jan"], 2);
        assert_eq!(stats.monthly_distribution["Feb"], 0);
        assert_eq!(stats.monthly_distribution["Mar"], 1);
        assert_eq!(stats.monthly_distribution["Dec"], 1);
        assert_eq!(stats.monthly_distribution.values().sum::<u32>(), 4);
    }

    #[test]
    fn test_monthly_distribution_uses_local_time() {
        let mut a = make_activity(1, "Run", "2024-01-31", 1.0);
        a.start_date = "2024-02-01T02:00:00Z".to_string();
        a.start_date_local = "2024-01-31T21:00:00Z".to_string();
        let distribution = monthly_distribution(&[a]);
        assert_eq!(distribution["Jan"], 1);
        assert_eq!(distribution["Feb"], 0);
    }

    #[test]
    fn test_longest_keeps_first_on_tie() {
        let activities = vec![
            make_activity(1, "Run", "2024-01-01", 1000.0),
            make_activity(2, "Run", "2024-01-02", 9000.0),
            make_activity(3, "Run", "2024-01-03", 9000.0),
        ];
        let stats = process_activities(&activities, day("2024-06-01"));
        assert_eq!(stats.longest_activity.unwrap().id, 2);
    }

    #[test]
    fn test_fastest_only_considers_speed_sports() {
        let mut swim = make_activity(1, "Swim", "2024-01-01", 1000.0);
        swim.average_speed = 50.0;
        let mut run = make_activity(2, "Run", "2024-01-02", 1000.0);
        run.average_speed = 4.0;
        let mut ride = make_activity(3, "VirtualRide", "2024-01-03", 1000.0);
        ride.average_speed = 9.0;
        let mut tie = make_activity(4, "Ride", "2024-01-04", 1000.0);
        tie.average_speed = 9.0;

        assert_eq!(
            fastest_activity(&[swim.clone(), run, ride, tie]).map(|a| a.id),
            Some(3)
        );
        assert!(fastest_activity(&[swim]).is_none());
    }

    #[test]
    fn test_streaks() {
        let activities = vec![
            make_activity(1, "Run", "2023-01-01", 1.0),
            make_activity(2, "Run", "2023-01-02", 1.0),
            make_activity(3, "Run", "2023-01-04", 1.0),
        ];

        let streaks = calculate_streaks(&activities, day("2023-01-02"));
        assert_eq!(streaks.longest_streak, 2);
        assert_eq!(streaks.current_streak, 2);

        let streaks = calculate_streaks(&activities, day("2023-01-10"));
        assert_eq!(streaks.longest_streak, 2);
        assert_eq!(streaks.current_streak, 0);

        let streaks = calculate_streaks(&activities, day("2023-01-05"));
        assert_eq!(streaks.current_streak, 1);
    }

    #[test]
    fn test_streaks_multiple_activities_same_day() {
        let activities = vec![
            make_activity(1, "Run", "2023-05-01", 1.0),
            make_activity(2, "Ride", "2023-05-01", 1.0),
            make_activity(3, "Run", "2023-05-02", 1.0),
            make_activity(4, "Run", "2023-05-03", 1.0),
        ];
        let streaks = calculate_streaks(&activities, day("2023-05-03"));
        assert_eq!(streaks.longest_streak, 3);
        assert_eq!(streaks.current_streak, 3);
    }

    #[test]
    fn test_streaks_across_month_boundary() {
        let activities = vec![
            make_activity(1, "Run", "2024-02-28", 1.0),
            make_activity(2, "Run", "2024-02-29", 1.0),
            make_activity(3, "Run", "2024-03-01", 1.0),
        ];
        assert_eq!(calculate_streaks(&activities, day("2024-03-20")).longest_streak, 3);
    }

    #[test]
    fn test_top_routes_sorted_and_truncated() {
        let mut activities: Vec<Activity> = (0..15)
            .map(|i| with_route(make_activity(i, "Ride", "2024-01-01", (i * 1000) as f64)))
            .collect();
        activities.push(make_activity(99, "Ride", "2024-01-01", 1_000_000.0));

        let routes = top_routes(&activities);
        assert_eq!(routes.len(), TOP_ROUTES);
        assert_eq!(routes[0].distance, 14.0);
        assert_eq!(routes[9].distance, 5.0);
        assert!(routes.iter().all(|r| !r.polyline.is_empty()));
        assert!(routes.iter().all(|r| r.name != "Test Activity 99"));
    }

    #[test]
    fn test_top_routes_equal_distances_kept() {
        let activities: Vec<Activity> = (0..3)
            .map(|i| with_route(make_activity(i, "Run", "2024-01-01", 5000.0)))
            .collect();
        assert_eq!(top_routes(&activities).len(), 3);
    }

    #[test]
    fn test_all_polylines() {
        let activities = vec![
            with_route(make_activity(1, "Run", "2024-01-01", 1.0)),
            make_activity(2, "Run", "2024-01-02", 1.0),
        ];
        let stats = process_activities(&activities, day("2024-06-01"));
        assert_eq!(stats.all_polylines.len(), 1);
    }

    #[test]
    fn test_top_locations() {
        let mut a = make_activity(1, "Run", "2024-01-01", 2000.0);
        a.location_city = Some("Palo Alto".to_string());
        a.location_country = Some("United States".to_string());
        let mut b = a.clone();
        b.id = 2;
        let mut c = make_activity(3, "Run", "2024-01-03", 1000.0);
        c.start_latlng = Some([37.4012, -122.1234]);
        let mut d = make_activity(4, "Run", "2024-01-04", 1000.0);
        d.start_latlng = Some([0.0, 0.0]);

        let locations = top_locations(&[c, a, b, d]);
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].city, "Palo Alto");
        assert_eq!(locations[0].count, 2);
        assert_eq!(locations[0].total_distance, 4.0);
        assert_eq!(locations[1].city, "37.40°, -122.12°");
        assert_eq!(locations[1].lat, 37.4012);
    }

    #[test]
    fn test_top_locations_limit() {
        let activities: Vec<Activity> = (0..8)
            .map(|i| {
                let mut a = make_activity(i, "Run", "2024-01-01", 1.0);
                a.location_city = Some(format!("City {}", i));
                a
            })
            .collect();
        assert_eq!(top_locations(&activities).len(), TOP_LOCATIONS);
    }
}
