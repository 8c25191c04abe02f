//! Rental cart: the user's orders, paged in, with local removal and totals.

use std::fmt;

use crate::catalog_client::OrderService;
use crate::domain::models::{Order, OrderedBook};
use crate::error::CatalogResult;

pub const CART_PAGE_SIZE: u32 = 60;

/// Flat rental price per book, in fils.
const PRICE_PER_BOOK: Money = Money(3950);
const DISCOUNT_PERCENT: i64 = 15;
const FREE_DELIVERY_ABOVE: Money = Money(10_000);
const DELIVERY_CHARGE: Money = Money(200);

/// Amount in minor units (1/100 AED).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(pub i64);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "AED {sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub books_count: usize,
    pub subtotal: Money,
    pub discount: Money,
    pub delivery: Money,
    pub total: Money,
}

pub fn totals(orders: &[Order]) -> CartTotals {
    let books_count: usize = orders.iter().map(|o| o.books.len()).sum();
    let subtotal = Money(PRICE_PER_BOOK.0 * books_count as i64);
    // Half-up rounding to whole fils.
    let discount = Money((subtotal.0 * DISCOUNT_PERCENT + 50) / 100);
    let delivery = if subtotal > FREE_DELIVERY_ABOVE {
        Money(0)
    } else {
        DELIVERY_CHARGE
    };
    CartTotals {
        books_count,
        subtotal,
        discount,
        delivery,
        total: Money(subtotal.0 - discount.0 + delivery.0),
    }
}

/// One outstanding orders request. A ticket superseded by a later refresh is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdersTicket {
    pub page: u32,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct Cart {
    orders: Vec<Order>,
    page: u32,
    has_more: bool,
    status: Option<u8>,
    next_seq: u64,
    in_flight: Option<OrdersTicket>,
    error: Option<String>,
}

impl Cart {
    pub fn new(status: Option<u8>) -> Self {
        Cart {
            page: 1,
            has_more: true,
            status,
            ..Default::default()
        }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn current_page(&self) -> u32 {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn totals(&self) -> CartTotals {
        totals(&self.orders)
    }

    fn issue(&mut self, page: u32) -> OrdersTicket {
        self.next_seq += 1;
        let ticket = OrdersTicket {
            page,
            seq: self.next_seq,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    /// Page 1 again. Supersedes whatever is in flight.
    pub fn begin_refresh(&mut self) -> OrdersTicket {
        self.issue(1)
    }

    /// The next page, or `None` while a request is out or once a short page came back.
    pub fn begin_load_more(&mut self) -> Option<OrdersTicket> {
        if self.in_flight.is_some() || !self.has_more {
            return None;
        }
        Some(self.issue(self.page + 1))
    }

    /// Applies the result of `ticket`. Superseded tickets change nothing. On failure the
    /// orders and page stay as they were and the user-facing message is kept.
    pub fn complete(
        &mut self,
        ticket: OrdersTicket,
        result: CatalogResult<Vec<Order>>,
    ) -> CatalogResult<()> {
        if self.in_flight != Some(ticket) {
            tracing::warn!(page = ticket.page, "dropping superseded orders response");
            return Ok(());
        }
        self.in_flight = None;
        match result {
            Ok(orders) => {
                self.apply_page(ticket.page, orders);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, page = ticket.page, "failed to fetch orders");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Reloads from page 1.
    pub async fn refresh<S>(&mut self, service: &S) -> CatalogResult<()>
    where
        S: OrderService + ?Sized,
    {
        let ticket = self.begin_refresh();
        self.run(service, ticket).await
    }

    /// Appends the next page; a no-op once the last page came back short.
    pub async fn load_more<S>(&mut self, service: &S) -> CatalogResult<()>
    where
        S: OrderService + ?Sized,
    {
        match self.begin_load_more() {
            Some(ticket) => self.run(service, ticket).await,
            None => Ok(()),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, service))]
    async fn run<S>(&mut self, service: &S, ticket: OrdersTicket) -> CatalogResult<()>
    where
        S: OrderService + ?Sized,
    {
        let result = service
            .fetch_orders(ticket.page, CART_PAGE_SIZE, self.status)
            .await;
        self.complete(ticket, result)
    }

    pub fn apply_page(&mut self, page: u32, orders: Vec<Order>) {
        self.has_more = orders.len() == CART_PAGE_SIZE as usize;
        if page == 1 {
            self.orders = orders;
        } else {
            self.orders.extend(orders);
        }
        self.page = page;
        self.error = None;
    }

    /// Drops one book from an order, locally only. Returns whether anything was removed.
    pub fn remove_book(&mut self, order_id: &str, item_id: &str) -> bool {
        let Some(order) = self.orders.iter_mut().find(|o| o.order_id == order_id) else {
            return false;
        };
        let before = order.books.len();
        order.books.retain(|b| b.item_id != item_id);
        before != order.books.len()
    }

    /// Books already handed over or returned, in order.
    pub fn borrowed_books(&self) -> Vec<&OrderedBook> {
        self.orders
            .iter()
            .flat_map(|o| o.books.iter())
            .filter(|b| matches!(b.status.as_deref(), Some("Delivered" | "Returned")))
            .collect()
    }
}
