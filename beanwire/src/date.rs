// Copyright (C) 2026 beanwire contributors
//
// This file is part of beanwire.
//
// beanwire is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// beanwire is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with beanwire.  If not, see <http://www.gnu.org/licenses/>.
//! date
//!
//! A thin newtype wrapping milliseconds-since-Unix-epoch, modeling the
//! wire format's dedicated `Date` variant (tag 9). Deliberately not tied
//! to any particular calendar/timezone library: the wire representation
//! is just an `i64`, and callers that want calendar arithmetic can convert
//! to/from their date library of choice at the boundary.
use parse_display::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("{0}ms-since-epoch")]
pub struct Date(pub i64);

impl Date {
    pub fn from_millis(millis: i64) -> Date {
        Date(millis)
    }

    pub fn millis(self) -> i64 {
        self.0
    }
}

impl From<i64> for Date {
    fn from(v: i64) -> Date {
        Date(v)
    }
}

impl From<Date> for i64 {
    fn from(d: Date) -> i64 {
        d.0
    }
}
