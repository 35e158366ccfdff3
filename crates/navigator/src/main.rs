use std::sync::Arc;

use config::NavigatorConfig;
use model::{Coordinate, ResultCode, RouteArtifact, RouteMarkType, Waypoint};
use reviews::{FeatureId, Rating, ReviewApi, ReviewsHandle, UgcUpdate};
use routing::{
    memory::{RecordingPresentation, StraightLineSearch},
    JsonFileSettings, RoutingBuilder, RoutingConfig, RoutingEvent, RoutingHandle,
};
use tokio_stream::StreamExt;

mod config;

/// Positions along the first half of the route, then a detour far enough
/// off the route to force a rebuild, then back towards the destination.
fn simulated_track(route: &RouteArtifact) -> Vec<Coordinate> {
    let polyline = route.polyline();
    let half = polyline.len() / 2;
    let mut track = polyline[..=half].to_vec();
    let last = track[track.len() - 1];
    let detour = Coordinate::new(last.latitude + 0.01, last.longitude);
    track.push(detour);
    if let Some(finish) = route.final_point() {
        track.extend((1..=4).map(|step| {
            let fraction = step as f64 / 4.0;
            Coordinate::new(
                detour.latitude + (finish.latitude - detour.latitude) * fraction,
                detour.longitude + (finish.longitude - detour.longitude) * fraction,
            )
        }));
    }
    track
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let config = NavigatorConfig::from_env();

    // routing
    let settings = Arc::new(
        JsonFileSettings::open(config.settings_path()).expect("could not open settings."),
    );
    let presentation = Arc::new(RecordingPresentation::with_position(config.start));
    let backend = Arc::new(StraightLineSearch { samples: 8 });
    let (routing, mut events) = RoutingBuilder::new(backend, settings)
        .with_config(RoutingConfig::from_env())
        .with_presentation(&presentation)
        .start();

    routing
        .add_waypoint(Waypoint::my_position(RouteMarkType::Start))
        .await
        .expect("could not add start.");
    routing
        .add_waypoint(Waypoint::finish(config.finish).with_title("Raisdorf"))
        .await
        .expect("could not add finish.");
    let outcome = routing
        .build_route(config.build_time_budget)
        .await
        .expect("routing stopped.");
    log::info!("build: {:?}", outcome);

    match events.recv().await {
        Some(RoutingEvent::RouteBuilt {
            code: ResultCode::Success,
            ..
        }) => {}
        other => {
            log::error!("no route: {:?}", other);
            return;
        }
    }
    let Ok(Some(route)) = routing.route().await else {
        log::error!("route vanished");
        return;
    };
    log::info!(
        "route with {} points, {:.0} m",
        route.polyline().len(),
        route.length_m()
    );
    if let Ok(Some(altitude)) = routing.route_altitude().await {
        log::info!(
            "altitude between {} and {} ({:?})",
            altitude.min,
            altitude.max,
            altitude.units
        );
    }

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log::info!("routing event: {:?}", event);
        }
    });

    if let Err(why) = routing.follow_route().await {
        log::error!("could not follow the route: {}", why);
        return;
    }

    let feed = tokio_stream::iter(simulated_track(&route)).throttle(config.position_interval);
    tokio::pin!(feed);
    while let Some(position) = feed.next().await {
        presentation.set_position(Some(position));
        match routing.on_position_update(position).await {
            Ok(verdict) => log::info!(
                "{:.5},{:.5}: {:?}",
                position.latitude,
                position.longitude,
                verdict
            ),
            Err(why) => {
                log::error!("{}", why);
                break;
            }
        }
    }
    log::info!("state after the drive: {:?}", routing.state().await);
    let _ = routing.close_routing(false).await;

    // reviews
    let reviews = ReviewApi::start(config.reviews_path()).expect("could not open review storage.");
    let destination = FeatureId::new("Germany_Schleswig-Holstein", 1);
    match reviews.get_reviews(destination.clone()).await {
        Ok(ugc) => {
            for review in ugc.reviews {
                log::info!("{} ({}): {}", review.author.name, review.rating, review.text);
            }
        }
        Err(why) => log::error!("{}", why),
    }
    let update = UgcUpdate {
        rating: Rating::default().with("route", 5.0),
        text: Some("Easy to reach".to_owned()),
        ..Default::default()
    };
    if let Err(why) = reviews.set_review_update(destination, update).await {
        log::error!("could not store review: {}", why);
    }
}
