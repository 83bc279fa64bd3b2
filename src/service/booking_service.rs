use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    config::BookingConfig,
    domain::*,
    error::{AppError, Result},
    notifier::{notify_targets, Notifier},
    repository::{BookingRepository, InviteCodeRepository, PropertyRepository, UserRepository},
};

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    properties: Arc<dyn PropertyRepository>,
    invites: Arc<dyn InviteCodeRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Notifier,
    config: BookingConfig,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        properties: Arc<dyn PropertyRepository>,
        invites: Arc<dyn InviteCodeRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Notifier,
        config: BookingConfig,
    ) -> Self {
        Self {
            bookings,
            properties,
            invites,
            users,
            notifier,
            config,
        }
    }

    /// Scans existing stays for a conflict with the candidate range. The
    /// booking being edited, if any, is excluded so a date change does not
    /// collide with itself.
    ///
    /// This is an advisory read: creation still claims nights atomically, so
    /// a race slipping past this check fails at the claim instead.
    pub async fn check_availability(
        &self,
        property_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        check_in_minute: Option<i32>,
        check_out_minute: Option<i32>,
        exclude_booking: Option<Uuid>,
    ) -> Result<bool> {
        if check_in >= check_out {
            return Err(AppError::Validation(
                "Check-out date must be after check-in date".to_string(),
            ));
        }
        validate_minutes(check_in_minute)?;
        validate_minutes(check_out_minute)?;

        let (from, to) = scan_window(check_in, check_out, self.config.lookback_days);
        let existing = self.bookings.list_in_window(property_id, from, to).await?;

        let candidate = StayWindow::new(check_in, check_out, check_in_minute, check_out_minute);
        for booking in &existing {
            if Some(booking.id) == exclude_booking {
                continue;
            }
            if !booking.status.occupies_dates() {
                continue;
            }
            if candidate.conflicts_with(&StayWindow::from(booking)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn create_booking(&self, actor: &User, request: CreateBookingRequest) -> Result<Booking> {
        if request.guest_name.trim().is_empty() {
            return Err(AppError::Validation("Guest name is required".to_string()));
        }
        if request.check_in >= request.check_out {
            return Err(AppError::Validation(
                "Check-out date must be after check-in date".to_string(),
            ));
        }
        validate_minutes(request.check_in_minute)?;
        validate_minutes(request.check_out_minute)?;
        if request.total_amount.is_some_and(|t| t < 0) {
            return Err(AppError::Validation("Total amount cannot be negative".to_string()));
        }
        if request.commission.is_some_and(|c| c < 0) {
            return Err(AppError::Validation("Commission cannot be negative".to_string()));
        }

        let property = self
            .properties
            .find_by_id(request.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        if !property.active {
            return Err(AppError::BadRequest(
                "Property is not accepting bookings".to_string(),
            ));
        }
        if !actor.can_manage(&property) {
            return Err(AppError::Forbidden);
        }

        // An invite code is validated up front but only consumed once the
        // booking lands.
        let invite = match &request.invite_code {
            Some(code) => Some(self.validate_invite(code, property.id).await?),
            None => None,
        };

        let available = self
            .check_availability(
                property.id,
                request.check_in,
                request.check_out,
                request.check_in_minute,
                request.check_out_minute,
                None,
            )
            .await?;
        if !available {
            return Err(AppError::Conflict(
                "Property is not available for the selected dates".to_string(),
            ));
        }

        let nights = (request.check_out - request.check_in).num_days();
        let total_amount = request
            .total_amount
            .unwrap_or(property.nightly_price * nights);

        let booking = Booking {
            id: Uuid::new_v4(),
            property_id: property.id,
            guest_name: request.guest_name.trim().to_string(),
            guest_phone: request.guest_phone,
            check_in: request.check_in,
            check_out: request.check_out,
            check_in_minute: request.check_in_minute,
            check_out_minute: request.check_out_minute,
            nightly_price: property.nightly_price,
            total_amount,
            currency: property.currency.clone(),
            status: BookingStatus::PendingConfirmation,
            created_by: actor.id,
            invite_code: request.invite_code.clone(),
            commission: request.commission,
            notes: request.notes,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let booking = self.bookings.create(booking).await?;

        if let Some(invite) = invite {
            self.consume_invite(&invite, actor).await;
        }

        let recipients = notify_targets(property.owner_id, booking.created_by, actor.id);
        self.notifier.booking_created(recipients, &booking, &property);

        Ok(booking)
    }

    pub async fn get_booking(&self, actor: &User, id: Uuid) -> Result<Booking> {
        let booking = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        self.authorize_booking(actor, &booking).await?;
        Ok(booking)
    }

    pub async fn update_booking(
        &self,
        actor: &User,
        id: Uuid,
        request: UpdateBookingRequest,
    ) -> Result<Booking> {
        let existing = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        self.authorize_booking(actor, &existing).await?;

        validate_minutes(request.check_in_minute)?;
        validate_minutes(request.check_out_minute)?;
        if request.total_amount.is_some_and(|t| t < 0) {
            return Err(AppError::Validation("Total amount cannot be negative".to_string()));
        }

        let check_in = request.check_in.unwrap_or(existing.check_in);
        let check_out = request.check_out.unwrap_or(existing.check_out);
        if check_in >= check_out {
            return Err(AppError::Validation(
                "Check-out date must be after check-in date".to_string(),
            ));
        }
        let check_in_minute = request.check_in_minute.or(existing.check_in_minute);
        let check_out_minute = request.check_out_minute.or(existing.check_out_minute);

        let dates_changed = check_in != existing.check_in || check_out != existing.check_out;
        if dates_changed && existing.status.occupies_dates() {
            let available = self
                .check_availability(
                    existing.property_id,
                    check_in,
                    check_out,
                    check_in_minute,
                    check_out_minute,
                    Some(existing.id),
                )
                .await?;
            if !available {
                return Err(AppError::Conflict(
                    "Property is not available for the selected dates".to_string(),
                ));
            }
        }

        // A date change reprices the stay unless the caller pins the total.
        let total_amount = match request.total_amount {
            Some(total) => total,
            None if dates_changed => existing.nightly_price * (check_out - check_in).num_days(),
            None => existing.total_amount,
        };

        let updated = Booking {
            guest_name: request
                .guest_name
                .unwrap_or_else(|| existing.guest_name.clone()),
            guest_phone: request.guest_phone.or_else(|| existing.guest_phone.clone()),
            check_in,
            check_out,
            check_in_minute,
            check_out_minute,
            total_amount,
            commission: request.commission.or(existing.commission),
            notes: request.notes.or_else(|| existing.notes.clone()),
            ..existing
        };

        self.bookings.update(id, updated).await
    }

    /// Applies the new status as-is; the transition graph is not enforced
    /// here. Slot claims move with the status so cancelled nights free up
    /// immediately.
    pub async fn update_status(
        &self,
        actor: &User,
        id: Uuid,
        new_status: BookingStatus,
    ) -> Result<Booking> {
        let existing = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        self.authorize_booking(actor, &existing).await?;

        let booking = self.bookings.update_status(id, new_status).await?;

        if let Some(property) = self.properties.find_by_id(booking.property_id).await? {
            let recipients = notify_targets(property.owner_id, booking.created_by, actor.id);
            self.notifier
                .booking_status_changed(recipients, &booking, &property, new_status);
        }

        Ok(booking)
    }

    pub async fn delete_booking(&self, actor: &User, id: Uuid) -> Result<()> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        self.bookings.delete(id).await
    }

    pub async fn list_all(&self, actor: &User, limit: i64, offset: i64) -> Result<Vec<Booking>> {
        if actor.role != UserRole::Admin {
            return Err(AppError::Forbidden);
        }
        self.bookings.list(limit, offset).await
    }

    pub async fn list_for_property(
        &self,
        actor: &User,
        property_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>> {
        let property = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        if !actor.can_manage(&property) {
            return Err(AppError::Forbidden);
        }
        self.bookings
            .list_for_property(property_id, limit, offset)
            .await
    }

    /// Bookings the acting user created, newest stay first.
    pub async fn list_mine(&self, actor: &User, limit: i64, offset: i64) -> Result<Vec<Booking>> {
        self.bookings.list_created_by(actor.id, limit, offset).await
    }

    /// Occupying stays intersecting the given month, for calendar views.
    pub async fn month_calendar(
        &self,
        actor: &User,
        property_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<Booking>> {
        let property = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        if !actor.can_manage(&property) {
            return Err(AppError::Forbidden);
        }

        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::Validation("Invalid month".to_string()))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| AppError::Validation("Invalid month".to_string()))?;

        let (from, to) = scan_window(first, next_month, self.config.lookback_days);
        let bookings = self.bookings.list_in_window(property_id, from, to).await?;

        Ok(bookings
            .into_iter()
            .filter(|b| b.status.occupies_dates())
            .filter(|b| ranges_overlap(b.check_in, b.check_out, first, next_month))
            .collect())
    }

    async fn authorize_booking(&self, actor: &User, booking: &Booking) -> Result<()> {
        if booking.created_by == actor.id {
            return Ok(());
        }
        let property = self
            .properties
            .find_by_id(booking.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        if !actor.can_manage(&property) {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    async fn validate_invite(&self, code: &str, property_id: Uuid) -> Result<InviteCode> {
        let invite = self
            .invites
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invite code not found".to_string()))?;

        if invite.property_id != property_id {
            return Err(AppError::Conflict(
                "Invite code is not valid for this property".to_string(),
            ));
        }
        if let Some(reason) = invite.usability_error(Utc::now()) {
            return Err(AppError::Conflict(reason.to_string()));
        }
        Ok(invite)
    }

    /// Post-create bookkeeping: bump the use count and link the agent to the
    /// property. The booking already exists, so failures here are logged and
    /// swallowed rather than surfaced as a failed creation.
    async fn consume_invite(&self, invite: &InviteCode, actor: &User) {
        if let Err(e) = self.invites.increment_use(invite.id).await {
            tracing::error!("Failed to record invite code use {}: {}", invite.code, e);
        }
        if actor.role == UserRole::Agent {
            if let Err(e) = self
                .users
                .link_managed_property(actor.id, invite.property_id)
                .await
            {
                tracing::error!("Failed to link agent {} to property: {}", actor.id, e);
            }
        }
    }
}

fn validate_minutes(minutes: Option<i32>) -> Result<()> {
    if minutes.is_some_and(|m| !(0..1440).contains(&m)) {
        return Err(AppError::Validation(
            "Time of day must be between 0 and 1439 minutes".to_string(),
        ));
    }
    Ok(())
}
