//! Static vocabulary data.

use sports_query_core::{slot, Action, Domain};

/// One canonical term and the surface forms that name it.
pub struct TermDef {
    /// Canonical slot value.
    pub canonical: &'static str,
    /// Human display name.
    pub display: &'static str,
    /// Provider-side identifier, when it differs from the canonical value.
    pub provider_id: Option<&'static str>,
    pub aliases: &'static [&'static str],
}

/// Action keywords and slot schema.
pub struct ActionDef {
    pub domain: Domain,
    pub action: Action,
    pub keywords: &'static [&'static str],
    pub slots: &'static [&'static str],
}

/// Words that identify a domain on their own.
pub const DOMAIN_KEYWORDS: &[(Domain, &[&str])] = &[
    (
        Domain::Motorsport,
        &[
            "f1", "formula 1", "formula one", "grand prix", "motorsport", "一级方程式", "赛车",
            "车手", "车队", "大奖赛", "排位赛", "方程式",
        ],
    ),
    (
        Domain::Football,
        &["football", "soccer", "足球", "联赛", "欧冠", "球会"],
    ),
    (Domain::Basketball, &["nba", "basketball", "篮球"]),
];

/// Earliest season accepted as a `year` slot.
pub fn first_season(domain: Domain) -> i32 {
    match domain {
        Domain::Motorsport => 1950,
        Domain::Football => 1990,
        Domain::Basketball => 1947,
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Declaration order breaks keyword ties.
pub const ACTIONS: &[ActionDef] = &[
    ActionDef {
        domain: Domain::Motorsport,
        action: Action::QualifyingResults,
        keywords: &["排位赛", "排位", "杆位", "qualifying", "quali", "pole"],
        slots: &[slot::YEAR, slot::ROUND],
    },
    ActionDef {
        domain: Domain::Motorsport,
        action: Action::RaceResults,
        keywords: &["比赛结果", "结果", "成绩", "冠军", "results", "result", "winner"],
        slots: &[slot::YEAR, slot::ROUND],
    },
    ActionDef {
        domain: Domain::Motorsport,
        action: Action::DriverStandings,
        keywords: &[
            "车手积分榜", "车手积分", "车手排名", "车手", "积分榜", "排名", "driver standings",
            "drivers", "driver", "standings",
        ],
        slots: &[slot::YEAR],
    },
    ActionDef {
        domain: Domain::Motorsport,
        action: Action::ConstructorStandings,
        keywords: &[
            "车队积分榜", "车队积分", "车队排名", "车队", "制造商", "constructor standings",
            "constructors", "constructor", "teams",
        ],
        slots: &[slot::YEAR],
    },
    ActionDef {
        domain: Domain::Motorsport,
        action: Action::Schedule,
        keywords: &["赛程", "赛历", "日程", "时间表", "比赛安排", "schedule", "calendar"],
        slots: &[slot::YEAR],
    },
    ActionDef {
        domain: Domain::Football,
        action: Action::TopScorers,
        keywords: &["射手榜", "射手", "进球榜", "进球", "金靴", "top scorers", "scorers", "goals"],
        slots: &[slot::LEAGUE],
    },
    ActionDef {
        domain: Domain::Football,
        action: Action::Standings,
        keywords: &["积分榜", "排名", "排行榜", "榜单", "standings", "table"],
        slots: &[slot::LEAGUE],
    },
    ActionDef {
        domain: Domain::Football,
        action: Action::LiveMatches,
        keywords: &["实时", "直播", "现场", "正在进行", "live"],
        slots: &[],
    },
    ActionDef {
        domain: Domain::Football,
        action: Action::TodayMatches,
        keywords: &["今天", "今日", "当天", "今晚", "today", "tonight", "matches", "fixtures"],
        slots: &[slot::DATE],
    },
    ActionDef {
        domain: Domain::Basketball,
        action: Action::PlayerStats,
        keywords: &["数据", "统计", "表现", "场均", "得分", "stats", "statistics"],
        slots: &[slot::PLAYER],
    },
    ActionDef {
        domain: Domain::Basketball,
        action: Action::TeamRoster,
        keywords: &["阵容", "名单", "球员名单", "球员", "roster", "lineup", "players"],
        slots: &[slot::TEAM],
    },
    ActionDef {
        domain: Domain::Basketball,
        action: Action::TeamSchedule,
        keywords: &["赛程", "日程", "比赛安排", "时间表", "schedule", "games"],
        slots: &[slot::TEAM],
    },
    ActionDef {
        domain: Domain::Basketball,
        action: Action::Standings,
        keywords: &["积分榜", "排名", "战绩", "排行榜", "standings", "rankings"],
        slots: &[slot::YEAR],
    },
    ActionDef {
        domain: Domain::Basketball,
        action: Action::Teams,
        keywords: &["球队", "队伍", "所有球队", "teams"],
        slots: &[],
    },
];

// =============================================================================
// Football leagues
// =============================================================================

pub const LEAGUES: &[TermDef] = &[
    TermDef {
        canonical: "PL",
        display: "Premier League",
        provider_id: None,
        aliases: &["pl", "epl", "premier league", "英超", "英格兰超级联赛"],
    },
    TermDef {
        canonical: "PD",
        display: "La Liga",
        provider_id: None,
        aliases: &["pd", "la liga", "laliga", "primera division", "西甲", "西班牙甲级联赛"],
    },
    TermDef {
        canonical: "BL1",
        display: "Bundesliga",
        provider_id: None,
        aliases: &["bl1", "bundesliga", "德甲", "德国甲级联赛"],
    },
    TermDef {
        canonical: "SA",
        display: "Serie A",
        provider_id: None,
        aliases: &["serie a", "意甲", "意大利甲级联赛"],
    },
    TermDef {
        canonical: "FL1",
        display: "Ligue 1",
        provider_id: None,
        aliases: &["fl1", "ligue 1", "ligue one", "法甲", "法国甲级联赛"],
    },
    TermDef {
        canonical: "PPL",
        display: "Primeira Liga",
        provider_id: None,
        aliases: &["ppl", "primeira liga", "葡超"],
    },
    TermDef {
        canonical: "DED",
        display: "Eredivisie",
        provider_id: None,
        aliases: &["ded", "eredivisie", "荷甲"],
    },
    TermDef {
        canonical: "BSA",
        display: "Campeonato Brasileiro Série A",
        provider_id: None,
        aliases: &["bsa", "brasileirao", "巴甲"],
    },
    TermDef {
        canonical: "CL",
        display: "UEFA Champions League",
        provider_id: None,
        aliases: &["champions league", "ucl", "欧冠", "欧洲冠军联赛"],
    },
    TermDef {
        canonical: "ELC",
        display: "Championship",
        provider_id: None,
        aliases: &["elc", "efl championship", "英冠"],
    },
];

// =============================================================================
// NBA teams
// =============================================================================

macro_rules! team {
    ($name:literal, $id:literal, $full:literal, [$($alias:literal),* $(,)?]) => {
        TermDef {
            canonical: $name,
            display: $full,
            provider_id: Some($id),
            aliases: &[$($alias),*],
        }
    };
}

pub const TEAMS: &[TermDef] = &[
    team!("Hawks", "1", "Atlanta Hawks", ["hawks", "atl", "atlanta hawks", "老鹰", "亚特兰大老鹰"]),
    team!("Celtics", "2", "Boston Celtics", ["celtics", "bos", "boston celtics", "凯尔特人", "绿军", "波士顿凯尔特人"]),
    team!("Nets", "17", "Brooklyn Nets", ["nets", "bkn", "brooklyn nets", "篮网", "布鲁克林篮网"]),
    team!("Hornets", "30", "Charlotte Hornets", ["hornets", "cha", "charlotte hornets", "黄蜂", "夏洛特黄蜂"]),
    team!("Bulls", "4", "Chicago Bulls", ["bulls", "chi", "chicago bulls", "公牛", "芝加哥公牛"]),
    team!("Cavaliers", "5", "Cleveland Cavaliers", ["cavaliers", "cavs", "cle", "cleveland cavaliers", "骑士", "克利夫兰骑士"]),
    team!("Pistons", "8", "Detroit Pistons", ["pistons", "det", "detroit pistons", "活塞", "底特律活塞"]),
    team!("Pacers", "11", "Indiana Pacers", ["pacers", "ind", "indiana pacers", "步行者", "印第安纳步行者"]),
    team!("Heat", "14", "Miami Heat", ["heat", "mia", "miami heat", "热火", "迈阿密热火"]),
    team!("Bucks", "15", "Milwaukee Bucks", ["bucks", "mil", "milwaukee bucks", "雄鹿", "密尔沃基雄鹿"]),
    team!("Knicks", "18", "New York Knicks", ["knicks", "nyk", "new york knicks", "尼克斯", "纽约尼克斯"]),
    team!("Magic", "19", "Orlando Magic", ["magic", "orl", "orlando magic", "魔术", "奥兰多魔术"]),
    team!("76ers", "20", "Philadelphia 76ers", ["76ers", "sixers", "phi", "philadelphia 76ers", "76人", "费城76人"]),
    team!("Raptors", "28", "Toronto Raptors", ["raptors", "tor", "toronto raptors", "猛龙", "多伦多猛龙"]),
    team!("Wizards", "27", "Washington Wizards", ["wizards", "wsh", "washington wizards", "奇才", "华盛顿奇才"]),
    team!("Nuggets", "7", "Denver Nuggets", ["nuggets", "den", "denver nuggets", "掘金", "丹佛掘金"]),
    team!("Timberwolves", "16", "Minnesota Timberwolves", ["timberwolves", "wolves", "minnesota timberwolves", "森林狼", "明尼苏达森林狼"]),
    team!("Thunder", "25", "Oklahoma City Thunder", ["thunder", "okc", "oklahoma city thunder", "雷霆", "俄克拉荷马雷霆"]),
    team!("Trail Blazers", "22", "Portland Trail Blazers", ["trail blazers", "blazers", "por", "portland trail blazers", "开拓者", "波特兰开拓者"]),
    team!("Jazz", "26", "Utah Jazz", ["jazz", "uta", "utah jazz", "爵士", "犹他爵士"]),
    team!("Warriors", "9", "Golden State Warriors", ["warriors", "gsw", "golden state warriors", "勇士", "金州勇士"]),
    team!("Clippers", "12", "Los Angeles Clippers", ["clippers", "lac", "los angeles clippers", "快船", "洛杉矶快船"]),
    team!("Lakers", "13", "Los Angeles Lakers", ["lakers", "lal", "los angeles lakers", "湖人", "洛杉矶湖人"]),
    team!("Suns", "21", "Phoenix Suns", ["suns", "phx", "phoenix suns", "太阳", "菲尼克斯太阳"]),
    team!("Kings", "23", "Sacramento Kings", ["kings", "sac", "sacramento kings", "国王", "萨克拉门托国王"]),
    team!("Mavericks", "6", "Dallas Mavericks", ["mavericks", "mavs", "dal", "dallas mavericks", "独行侠", "小牛", "达拉斯独行侠"]),
    team!("Rockets", "10", "Houston Rockets", ["rockets", "hou", "houston rockets", "火箭", "休斯顿火箭"]),
    team!("Grizzlies", "29", "Memphis Grizzlies", ["grizzlies", "mem", "memphis grizzlies", "灰熊", "孟菲斯灰熊"]),
    team!("Pelicans", "3", "New Orleans Pelicans", ["pelicans", "nop", "new orleans pelicans", "鹈鹕", "新奥尔良鹈鹕"]),
    team!("Spurs", "24", "San Antonio Spurs", ["spurs", "sas", "san antonio spurs", "马刺", "圣安东尼奥马刺"]),
];

// =============================================================================
// NBA players
// =============================================================================

pub const PLAYERS: &[TermDef] = &[
    TermDef {
        canonical: "LeBron James",
        display: "LeBron James",
        provider_id: Some("1966"),
        aliases: &["lebron james", "lebron", "詹姆斯", "勒布朗詹姆斯", "勒布朗"],
    },
    TermDef {
        canonical: "Stephen Curry",
        display: "Stephen Curry",
        provider_id: Some("3975"),
        aliases: &["stephen curry", "steph curry", "curry", "库里", "斯蒂芬库里"],
    },
    TermDef {
        canonical: "Kevin Durant",
        display: "Kevin Durant",
        provider_id: Some("3202"),
        aliases: &["kevin durant", "durant", "杜兰特", "凯文杜兰特"],
    },
    TermDef {
        canonical: "Giannis Antetokounmpo",
        display: "Giannis Antetokounmpo",
        provider_id: Some("3032977"),
        aliases: &["giannis antetokounmpo", "giannis", "antetokounmpo", "字母哥", "安特托昆博"],
    },
    TermDef {
        canonical: "Luka Doncic",
        display: "Luka Dončić",
        provider_id: Some("3945274"),
        aliases: &["luka doncic", "doncic", "luka", "东契奇", "卢卡东契奇"],
    },
    TermDef {
        canonical: "Jayson Tatum",
        display: "Jayson Tatum",
        provider_id: Some("4065648"),
        aliases: &["jayson tatum", "tatum", "塔图姆", "杰森塔图姆"],
    },
    TermDef {
        canonical: "Nikola Jokic",
        display: "Nikola Jokić",
        provider_id: Some("3112335"),
        aliases: &["nikola jokic", "jokic", "约基奇", "尼古拉约基奇"],
    },
    TermDef {
        canonical: "Joel Embiid",
        display: "Joel Embiid",
        provider_id: Some("3059318"),
        aliases: &["joel embiid", "embiid", "恩比德", "乔尔恩比德"],
    },
];

/// Alias tables per domain and slot.
pub const TABLES: &[(Domain, &str, &[TermDef])] = &[
    (Domain::Football, slot::LEAGUE, LEAGUES),
    (Domain::Basketball, slot::TEAM, TEAMS),
    (Domain::Basketball, slot::PLAYER, PLAYERS),
];

/// Fixed defaults for identifier slots.
pub const IDENTIFIER_DEFAULTS: &[(Domain, &str, &str)] = &[
    (Domain::Football, slot::LEAGUE, "PL"),
    (Domain::Basketball, slot::TEAM, "Lakers"),
    (Domain::Basketball, slot::PLAYER, "LeBron James"),
];
