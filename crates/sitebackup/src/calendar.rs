//! HTML calendar of stored archives
//!
//! Renders one year table per year holding archives, three months per row.
//! Days are marked `hasarchive` when an archive was created on them, the
//! reference day is marked `today` and later days `future`.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::fmt::Write;

const MONTHS_PER_ROW: u32 = 3;

const WEEKDAYS: [(&str, &str); 7] = [
    ("mon", "Mon"),
    ("tue", "Tue"),
    ("wed", "Wed"),
    ("thu", "Thu"),
    ("fri", "Fri"),
    ("sat", "Sat"),
    ("sun", "Sun"),
];

const STYLE: &str = r#"
body {
  font-family: "Arial", Helvetica, sans-serif;
  font-size: 1.6vw;
  line-height: 1.5vw;
  color: #2c3e50;
  background-color: #ecf0f1;
}
table, td, th { vertical-align: top; }
table.year { border-spacing: 0; border-collapse: separate; }
table.year td { padding: 1vw; }
table.month { border-spacing: 1vw; border-collapse: separate; }
table.month td {
  width: 3vw;
  height: 3vw;
  padding: 0;
  vertical-align: middle;
  text-align: center;
}
th.year {
  font-family: "Arial Black", Gadget, sans-serif;
  font-size: 2em;
  line-height: 2em;
  color: #3498db;
}
th.month {
  font-family: "Arial Black", Gadget, sans-serif;
  font-size: 1.2em;
  line-height: 2em;
}
th.mon, th.tue, th.wed, th.thu, th.fri, th.sat, th.sun {
  color: #bdc3c7;
  font-weight: normal;
}
.today { border-radius: 50%; box-shadow: 0 0 0 4px #2ecc71; }
.future { color: #bdc3c7; }
.hasarchive {
  font-weight: bold;
  color: #ecf0f1;
  background-color: #16a085;
  border-radius: 50%;
}
"#;

/// Days on which archives were created
#[derive(Debug, Clone)]
pub struct Calendar {
    dates: BTreeSet<NaiveDate>,
    today: NaiveDate,
}

impl Calendar {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> Self {
        Self {
            dates: dates.into_iter().collect(),
            today,
        }
    }

    /// Complete HTML page, or `None` when there are no archives
    pub fn render(&self) -> Option<String> {
        let first = self.dates.first()?.year();
        let last = self.dates.last()?.year();

        let years: String = (first..=last)
            .filter(|year| self.dates.iter().any(|d| d.year() == *year))
            .map(|year| self.format_year(year))
            .collect();

        Some(format!(
            "<!DOCTYPE HTML><html><head><meta charset=\"utf-8\"><title>Calendar</title>\
             <style type=\"text/css\">{STYLE}</style></head><body>{years}</body></html>"
        ))
    }

    /// Table with all months of `year`
    pub fn format_year(&self, year: i32) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" class=\"year\">\n\
             <tr><th colspan=\"{MONTHS_PER_ROW}\" class=\"year\">{year}</th></tr>\n"
        );

        for row in 0..(12 / MONTHS_PER_ROW) {
            html.push_str("<tr>");
            for column in 1..=MONTHS_PER_ROW {
                let month = row * MONTHS_PER_ROW + column;
                html.push_str("<td>");
                html.push_str(&self.format_month(year, month));
                html.push_str("</td>");
            }
            html.push_str("</tr>\n");
        }

        html.push_str("</table>\n");
        html
    }

    /// Table of one month; empty for an invalid month
    pub fn format_month(&self, year: i32, month: u32) -> String {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return String::new();
        };

        let mut html = String::new();
        let _ = write!(
            html,
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" class=\"month\">\n\
             <tr><th colspan=\"7\" class=\"month\">{}</th></tr>\n<tr>",
            first.format("%B")
        );
        for (class, name) in WEEKDAYS {
            let _ = write!(html, "<th class=\"{class}\">{name}</th>");
        }
        html.push_str("</tr>\n");

        let leading = first.weekday().num_days_from_monday() as usize;
        let mut cells: Vec<Option<NaiveDate>> = vec![None; leading];
        cells.extend(first.iter_days().take_while(|d| d.month() == month).map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }

        for week in cells.chunks(7) {
            html.push_str("<tr>");
            for (weekday, day) in week.iter().enumerate() {
                html.push_str(&self.format_day(*day, weekday));
            }
            html.push_str("</tr>\n");
        }

        html.push_str("</table>\n");
        html
    }

    fn format_day(&self, day: Option<NaiveDate>, weekday: usize) -> String {
        let Some(date) = day else {
            return "<td class=\"noday\">&nbsp;</td>".to_string();
        };

        let mut class = WEEKDAYS[weekday].0.to_string();
        if self.dates.contains(&date) {
            class.push_str(" hasarchive");
        }
        if date == self.today {
            class.push_str(" today");
        } else if date > self.today {
            class.push_str(" future");
        }
        format!("<td class=\"{class}\">{}</td>", date.day())
    }
}
