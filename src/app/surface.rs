use crate::core::{DisplaySurface, MapSnapshot, Storage};
use crate::utils::error::Result;
use serde_json::{json, Value};

pub const SNAPSHOT_FILE: &str = "markers.geojson";
pub const PAGE_FILE: &str = "index.html";

/// Publishes each render as a GeoJSON snapshot next to a static Leaflet page.
pub struct GeoJsonSurface<S: Storage> {
    storage: S,
}

impl<S: Storage> GeoJsonSurface<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes the viewer page. It only depends on the snapshot file name, so
    /// it is written once at startup.
    pub async fn write_page(&self) -> Result<()> {
        self.storage
            .write_file(PAGE_FILE, MAP_PAGE_HTML.as_bytes())
            .await
    }
}

/// Markers and clusters as one FeatureCollection. GeoJSON positions are
/// `[longitude, latitude]`.
pub fn snapshot_to_geojson(snapshot: &MapSnapshot) -> Value {
    let markers = snapshot.markers.iter().map(|marker| {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [marker.longitude, marker.latitude],
            },
            "properties": {
                "kind": "marker",
                "radius": marker.radius,
                "weight": marker.weight,
                "popup_html": marker.popup_html,
                "cluster": marker.cluster,
            },
        })
    });

    let clusters = snapshot.clusters.iter().map(|cluster| {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [cluster.longitude, cluster.latitude],
            },
            "properties": {
                "kind": "cluster",
                "id": cluster.id,
                "radius": cluster.icon.radius,
                "label": cluster.icon.label,
                "count": cluster.count,
                "total_weight": cluster.total_weight,
            },
        })
    });

    json!({
        "type": "FeatureCollection",
        "features": markers.chain(clusters).collect::<Vec<_>>(),
        "metadata": {
            "filter": snapshot.filter,
            "generated_at": snapshot.generated_at,
            "total_records": snapshot.total_records,
            "visible_records": snapshot.markers.len(),
        },
    })
}

impl<S: Storage> DisplaySurface for GeoJsonSurface<S> {
    async fn present(&self, snapshot: &MapSnapshot) -> Result<()> {
        let document = serde_json::to_vec_pretty(&snapshot_to_geojson(snapshot))?;
        tracing::debug!("Writing {} ({} bytes)", SNAPSHOT_FILE, document.len());
        self.storage.write_file(SNAPSHOT_FILE, &document).await
    }
}

pub const MAP_PAGE_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Activity Map</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <style>
    html, body, #map { height: 100%; margin: 0; }
    #status { position: absolute; bottom: 12px; left: 12px; z-index: 1000;
      background: rgba(255,255,255,0.9); padding: 4px 8px; font: 12px sans-serif; }
    .cluster-icon { background: rgba(255,0,0,0.6); border: 2px solid #000; border-radius: 50%;
      color: #fff; font-weight: bold; text-align: center; box-sizing: border-box; }
  </style>
</head>
<body>
  <div id="map"></div>
  <div id="status"></div>
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <script>
    const CLUSTER_ZOOM = 14;
    const map = L.map("map").setView([40.7128, -73.94], 10.5);
    L.tileLayer("https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png", {
      attribution: '&copy; <a href="https://www.openstreetmap.org/">OSM</a> &copy; <a href="https://carto.com/">CARTO</a>',
      subdomains: "abcd",
      maxZoom: 20
    }).addTo(map);

    const markerLayer = L.layerGroup();
    const clusterLayer = L.layerGroup();
    let snapshot = null;

    function draw() {
      markerLayer.clearLayers();
      clusterLayer.clearLayers();
      if (!snapshot) return;
      const zoomedOut = map.getZoom() < CLUSTER_ZOOM;
      for (const feature of snapshot.features) {
        const [lon, lat] = feature.geometry.coordinates;
        const p = feature.properties;
        if (p.kind === "cluster") {
          const size = p.radius * 2;
          const icon = L.divIcon({ className: "", iconSize: [size, size],
            html: '<div class="cluster-icon" style="width:' + size + 'px;height:' + size + 'px;line-height:' + size + 'px"></div>' });
          const m = L.marker([lat, lon], { icon });
          m.on("add", () => { m.getElement().firstChild.textContent = p.label; });
          m.on("click", () => map.setView([lat, lon], CLUSTER_ZOOM));
          clusterLayer.addLayer(m);
        } else {
          // members are drawn by their cluster icon while zoomed out
          if (zoomedOut && p.cluster !== null && p.cluster !== undefined) continue;
          // popup_html is escaped when the snapshot is written
          L.circleMarker([lat, lon], { radius: p.radius, color: "#000000", fillColor: "#ff0000",
            fillOpacity: 0.5, weight: 2 }).bindPopup(p.popup_html).addTo(markerLayer);
        }
      }
      map.addLayer(markerLayer);
      if (zoomedOut) map.addLayer(clusterLayer); else map.removeLayer(clusterLayer);
      const meta = snapshot.metadata;
      document.getElementById("status").textContent =
        meta.visible_records + " of " + meta.total_records + " reports (" + meta.filter + ")";
    }

    async function load() {
      try {
        const response = await fetch("markers.geojson", { cache: "no-store" });
        snapshot = await response.json();
        draw();
      } catch (err) {
        console.error("Error loading snapshot:", err);
      }
    }

    map.on("zoomend", draw);
    load();
    setInterval(load, 120000);
  </script>
</body>
</html>
"##;
