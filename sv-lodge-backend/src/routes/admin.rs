use http::{StatusCode, Uri};

use crate::front_desk::FrontDesk;
use crate::ledger::{filter_bookings, summarize, LedgerQuery};
use crate::routes::{json_response, read_query, Reply};

pub fn bookings(desk: &FrontDesk, uri: &Uri) -> Reply {
    desk.require_session()?.require_ledger()?;
    let query: LedgerQuery = read_query(uri)?;
    let bookings = filter_bookings(&desk.list_bookings()?, &query);
    json_response(StatusCode::OK, &bookings)
}

pub fn summary(desk: &FrontDesk) -> Reply {
    desk.require_session()?.require_ledger()?;
    json_response(StatusCode::OK, &summarize(&desk.list_bookings()?))
}
