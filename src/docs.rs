// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Bookings ---
        handlers::bookings::create_booking,
        handlers::bookings::verify_booking,
        handlers::bookings::next_available,

        // --- Slots ---
        handlers::slots::stream_availability,

        // --- Search ---
        handlers::search::search_spaces,
    ),
    components(
        schemas(
            // --- Spaces & slots ---
            models::space::SlotType,
            models::space::ParkingSpace,
            models::space::SlotGroup,
            models::space::SlotAvailability,
            models::space::AvailabilitySnapshot,
            models::space::SpaceSearchResult,
            models::space::SpaceWithSlots,
            models::space::CreateSpacePayload,
            models::space::CreateSlotGroupPayload,
            models::space::UpdateSlotGroupPayload,

            // --- Bookings ---
            models::booking::BookingStatus,
            models::booking::Booking,
            models::booking::BookingWithDriver,
            models::booking::TransitionKind,
            models::booking::Settlement,
            models::booking::CreateBookingPayload,
            models::booking::BookingCreatedResponse,
            models::booking::VerifyBookingPayload,
            models::booking::VerifyBookingResponse,
            models::booking::NextAvailableResponse,

            // --- Payments ---
            models::payment::PaymentStatus,
            models::payment::Payment,
            models::payment::ConfirmPaymentPayload,
        )
    ),
    tags(
        (name = "bookings", description = "Booking lifecycle and OTP verification"),
        (name = "slots", description = "Slot availability, live feed included"),
        (name = "search", description = "Proximity search over parking spaces"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
