//! Aggregation engine.
//!
//! Reports are computed synchronously from a [`ReportSnapshot`] fetched once
//! from a repository, so any kind and scope can be recomputed without touching
//! storage again. Aggregation never fails: zero denominators and empty input
//! produce `0.0`.
//!
//! Two ratio formulas coexist on purpose:
//! - `avg_ratio` is the mean of per-institution student/teacher ratios
//!   (institutions without teachers contribute `0`), used by the grouped
//!   reports and by [`ReportKind::Statistics`];
//! - the ratio of sums (Σstudents / Σteachers), used only by
//!   [`ReportKind::Financial`].

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{District, DistrictId, Institution, Region, RegionId};

/// Point-in-time copy of the registry used as aggregation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub regions: Vec<Region>,
    pub districts: Vec<District>,
    /// Institutions with their district (and region) hydrated.
    pub institutions: Vec<Institution>,
    pub taken_at: NaiveDateTime,
}

impl ReportSnapshot {
    pub fn new(regions: Vec<Region>, districts: Vec<District>, institutions: Vec<Institution>) -> Self {
        Self {
            regions,
            districts,
            institutions,
            taken_at: Local::now().naive_local(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.districts.is_empty() && self.institutions.is_empty()
    }

    /// Restrict the snapshot to a scope.
    ///
    /// For a region scope only that region, its districts and their
    /// institutions remain; for a district scope only that district, its
    /// parent region and its institutions remain.
    pub fn scoped(&self, scope: ReportScope) -> ReportSnapshot {
        match scope {
            ReportScope::Country => self.clone(),
            ReportScope::Region(region_id) => ReportSnapshot {
                regions: self
                    .regions
                    .iter()
                    .filter(|r| r.id == region_id)
                    .cloned()
                    .collect(),
                districts: self
                    .districts
                    .iter()
                    .filter(|d| d.region_id == region_id)
                    .cloned()
                    .collect(),
                institutions: self
                    .institutions
                    .iter()
                    .filter(|i| i.region_id() == Some(region_id))
                    .cloned()
                    .collect(),
                taken_at: self.taken_at,
            },
            ReportScope::District(district_id) => {
                let parent = self
                    .districts
                    .iter()
                    .find(|d| d.id == district_id)
                    .map(|d| d.region_id);
                ReportSnapshot {
                    regions: self
                        .regions
                        .iter()
                        .filter(|r| Some(r.id) == parent)
                        .cloned()
                        .collect(),
                    districts: self
                        .districts
                        .iter()
                        .filter(|d| d.id == district_id)
                        .cloned()
                        .collect(),
                    institutions: self
                        .institutions
                        .iter()
                        .filter(|i| i.district_id == district_id)
                        .cloned()
                        .collect(),
                    taken_at: self.taken_at,
                }
            }
        }
    }
}

/// The six report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    #[default]
    ByRegion,
    ByDistrict,
    ByType,
    Statistics,
    Infrastructure,
    Financial,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::ByRegion,
        ReportKind::ByDistrict,
        ReportKind::ByType,
        ReportKind::Statistics,
        ReportKind::Infrastructure,
        ReportKind::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::ByRegion => "by-region",
            ReportKind::ByDistrict => "by-district",
            ReportKind::ByType => "by-type",
            ReportKind::Statistics => "statistics",
            ReportKind::Infrastructure => "infrastructure",
            ReportKind::Financial => "financial",
        }
    }

    /// Human-readable report title.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::ByRegion => "Отчёт по регионам",
            ReportKind::ByDistrict => "Отчёт по районам",
            ReportKind::ByType => "Отчёт по типам учреждений",
            ReportKind::Statistics => "Статистический отчёт",
            ReportKind::Infrastructure => "Отчёт по инфраструктуре",
            ReportKind::Financial => "Финансовый отчёт",
        }
    }

    /// Grouped kinds produce one row per group with the full metric set.
    pub fn is_grouped(&self) -> bool {
        matches!(
            self,
            ReportKind::ByRegion | ReportKind::ByDistrict | ReportKind::ByType
        )
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "by-region" | "region" | "regions" => Ok(ReportKind::ByRegion),
            "by-district" | "district" | "districts" => Ok(ReportKind::ByDistrict),
            "by-type" | "type" | "types" => Ok(ReportKind::ByType),
            "statistics" | "stats" => Ok(ReportKind::Statistics),
            "infrastructure" => Ok(ReportKind::Infrastructure),
            "financial" => Ok(ReportKind::Financial),
            other => Err(format!(
                "Unknown report kind '{}'. Expected one of: by-region, by-district, by-type, statistics, infrastructure, financial",
                other
            )),
        }
    }
}

/// Portion of the registry a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "scope", content = "id", rename_all = "kebab-case")]
pub enum ReportScope {
    #[default]
    Country,
    Region(RegionId),
    District(DistrictId),
}

impl fmt::Display for ReportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportScope::Country => f.write_str("country"),
            ReportScope::Region(id) => write!(f, "region:{}", id),
            ReportScope::District(id) => write!(f, "district:{}", id),
        }
    }
}

impl FromStr for ReportScope {
    type Err = String;

    /// Parses `country`, `region:<id>` or `district:<id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "country" {
            return Ok(ReportScope::Country);
        }
        let (level, id) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid scope '{}'. Expected country, region:<id> or district:<id>", s))?;
        let id: i32 = id
            .trim()
            .parse()
            .map_err(|_| format!("Invalid scope id '{}'", id))?;
        match level {
            "region" => Ok(ReportScope::Region(RegionId(id))),
            "district" => Ok(ReportScope::District(DistrictId(id))),
            other => Err(format!("Unknown scope level '{}'", other)),
        }
    }
}

/// One line of a report.
///
/// Grouped kinds fill the counters and `avg_ratio`; flat kinds fill `value`
/// plus the counter the metric corresponds to, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub category: String,
    pub institution_count: i64,
    pub student_count: i64,
    pub teacher_count: i64,
    pub staff_count: i64,
    pub admitted_count: i64,
    pub expelled_count: i64,
    pub computer_count: i64,
    pub classroom_count: i64,
    pub avg_ratio: f64,
    pub value: f64,
}

impl ReportRow {
    fn flat(category: &str, value: f64) -> Self {
        Self {
            category: category.to_string(),
            value,
            ..Default::default()
        }
    }

    /// `avg_ratio` as `"1:R"` with one decimal.
    pub fn ratio_display(&self) -> String {
        format!("1:{:.1}", self.avg_ratio)
    }

    /// `value` as an integer when whole, otherwise with two decimals.
    pub fn value_display(&self) -> String {
        if self.value.fract() == 0.0 {
            format!("{:.0}", self.value)
        } else {
            format!("{:.2}", self.value)
        }
    }
}

/// Footer sums over the produced rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub institutions: i64,
    pub students: i64,
    pub teachers: i64,
    pub staff: i64,
}

impl ReportTotals {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        rows.iter().fold(Self::default(), |acc, r| Self {
            institutions: acc.institutions + r.institution_count,
            students: acc.students + r.student_count,
            teachers: acc.teachers + r.teacher_count,
            staff: acc.staff + r.staff_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub kind: ReportKind,
    pub scope: ReportScope,
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

impl Report {
    /// Generation timestamp as `dd.mm.yyyy HH:MM`.
    pub fn generated_at_display(&self) -> String {
        self.generated_at.format("%d.%m.%Y %H:%M").to_string()
    }
}

/// Compute a report of `kind` over the part of `snapshot` selected by `scope`.
pub fn generate_report(snapshot: &ReportSnapshot, kind: ReportKind, scope: ReportScope) -> Report {
    let scoped = snapshot.scoped(scope);

    let rows = match kind {
        ReportKind::ByRegion => by_region(&scoped),
        ReportKind::ByDistrict => by_district(&scoped),
        ReportKind::ByType => by_type(&scoped.institutions),
        ReportKind::Statistics => statistics(&scoped.institutions),
        ReportKind::Infrastructure => infrastructure(&scoped.institutions),
        ReportKind::Financial => financial(&scoped.institutions),
    };

    log::debug!(
        "Generated {} report ({}) with {} rows from {} institutions",
        kind,
        scope,
        rows.len(),
        scoped.institutions.len()
    );

    Report {
        kind,
        scope,
        title: kind.title().to_string(),
        generated_at: Local::now().naive_local(),
        totals: ReportTotals::from_rows(&rows),
        rows,
    }
}

fn by_region(snapshot: &ReportSnapshot) -> Vec<ReportRow> {
    snapshot
        .regions
        .iter()
        .filter_map(|region| {
            let members: Vec<&Institution> = snapshot
                .institutions
                .iter()
                .filter(|i| i.region_id() == Some(region.id))
                .collect();
            group_row(&region.name, &members)
        })
        .collect()
}

fn by_district(snapshot: &ReportSnapshot) -> Vec<ReportRow> {
    snapshot
        .districts
        .iter()
        .filter_map(|district| {
            let members: Vec<&Institution> = snapshot
                .institutions
                .iter()
                .filter(|i| i.district_id == district.id)
                .collect();
            group_row(&district.display_label(&snapshot.regions), &members)
        })
        .collect()
}

fn by_type(institutions: &[Institution]) -> Vec<ReportRow> {
    let mut types: Vec<&str> = Vec::new();
    for inst in institutions {
        if !types.contains(&inst.institution_type.as_str()) {
            types.push(&inst.institution_type);
        }
    }

    types
        .into_iter()
        .filter_map(|kind| {
            let members: Vec<&Institution> = institutions
                .iter()
                .filter(|i| i.institution_type == kind)
                .collect();
            group_row(kind, &members)
        })
        .collect()
}

/// Full metric row for a group, or `None` for an empty group.
fn group_row(category: &str, members: &[&Institution]) -> Option<ReportRow> {
    if members.is_empty() {
        return None;
    }

    let sum = |f: fn(&Institution) -> i32| members.iter().map(|i| f(i) as i64).sum::<i64>();

    Some(ReportRow {
        category: category.to_string(),
        institution_count: members.len() as i64,
        student_count: sum(|i| i.student_count),
        teacher_count: sum(|i| i.teacher_count),
        staff_count: sum(|i| i.staff_count),
        admitted_count: sum(|i| i.admitted_count),
        expelled_count: sum(|i| i.expelled_count),
        computer_count: sum(|i| i.computer_count),
        classroom_count: sum(|i| i.classroom_count),
        avg_ratio: mean(members.iter().map(|i| i.student_teacher_ratio())),
        value: 0.0,
    })
}

fn statistics(institutions: &[Institution]) -> Vec<ReportRow> {
    let count = institutions.len() as i64;
    let students = sum_of(institutions, |i| i.student_count);
    let teachers = sum_of(institutions, |i| i.teacher_count);
    let staff = sum_of(institutions, |i| i.staff_count);
    let admitted = sum_of(institutions, |i| i.admitted_count);
    let expelled = sum_of(institutions, |i| i.expelled_count);
    let avg_ratio = mean(institutions.iter().map(|i| i.student_teacher_ratio()));

    vec![
        ReportRow {
            institution_count: count,
            ..ReportRow::flat("Всего учреждений", count as f64)
        },
        ReportRow {
            student_count: students,
            ..ReportRow::flat("Всего учащихся", students as f64)
        },
        ReportRow {
            teacher_count: teachers,
            ..ReportRow::flat("Всего преподавателей", teachers as f64)
        },
        ReportRow {
            staff_count: staff,
            ..ReportRow::flat("Всего персонала", staff as f64)
        },
        ReportRow {
            admitted_count: admitted,
            ..ReportRow::flat("Принято учащихся", admitted as f64)
        },
        ReportRow {
            expelled_count: expelled,
            ..ReportRow::flat("Отчислено учащихся", expelled as f64)
        },
        ReportRow {
            avg_ratio,
            ..ReportRow::flat("Среднее соотношение ученик/учитель", avg_ratio)
        },
    ]
}

fn infrastructure(institutions: &[Institution]) -> Vec<ReportRow> {
    let with_sports_hall = institutions.iter().filter(|i| i.has_sports_hall).count() as i64;
    let with_dining_room = institutions.iter().filter(|i| i.has_dining_room).count() as i64;
    let with_library = institutions.iter().filter(|i| i.has_library).count() as i64;
    let computers = sum_of(institutions, |i| i.computer_count);
    let classrooms = sum_of(institutions, |i| i.classroom_count);
    let avg_area = mean(institutions.iter().map(|i| i.total_area));

    vec![
        ReportRow {
            institution_count: with_sports_hall,
            ..ReportRow::flat("Учреждения со спортзалом", with_sports_hall as f64)
        },
        ReportRow {
            institution_count: with_dining_room,
            ..ReportRow::flat("Учреждения со столовой", with_dining_room as f64)
        },
        ReportRow {
            institution_count: with_library,
            ..ReportRow::flat("Учреждения с библиотекой", with_library as f64)
        },
        ReportRow {
            computer_count: computers,
            ..ReportRow::flat("Всего компьютеров", computers as f64)
        },
        ReportRow {
            classroom_count: classrooms,
            ..ReportRow::flat("Всего учебных кабинетов", classrooms as f64)
        },
        ReportRow::flat("Средняя площадь учреждений (м²)", avg_area),
    ]
}

fn financial(institutions: &[Institution]) -> Vec<ReportRow> {
    let count = institutions.len();
    let students = sum_of(institutions, |i| i.student_count);
    let teachers = sum_of(institutions, |i| i.teacher_count);
    let with_library = institutions.iter().filter(|i| i.has_library).count();
    let with_sports_hall = institutions.iter().filter(|i| i.has_sports_hall).count();

    vec![
        ReportRow::flat(
            "Среднее количество учащихся на учреждение",
            ratio(students as f64, count as f64),
        ),
        ReportRow::flat(
            "Среднее количество преподавателей на учреждение",
            ratio(teachers as f64, count as f64),
        ),
        ReportRow::flat(
            "Общее соотношение ученик/учитель",
            ratio(students as f64, teachers as f64),
        ),
        ReportRow::flat(
            "Процент учреждений с библиотекой",
            ratio(with_library as f64, count as f64) * 100.0,
        ),
        ReportRow::flat(
            "Процент учреждений со спортзалом",
            ratio(with_sports_hall as f64, count as f64) * 100.0,
        ),
    ]
}

fn sum_of(institutions: &[Institution], f: fn(&Institution) -> i32) -> i64 {
    institutions.iter().map(|i| f(i) as i64).sum()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    ratio(sum, count as f64)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
